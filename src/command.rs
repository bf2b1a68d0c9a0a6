use std::collections::BTreeMap;
use std::fmt;

use crate::error::ReplayResult;
use crate::parse::{command_display_name, real_command, tokenize};
use crate::utils::{quote_word, shell_quote};

/// One command recovered from a test runner log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Name of the `#section:` the command came from.
    pub section: String,
    /// Shell text to run.
    pub command: String,
    /// Variables set for the command on top of the caller's environment.
    pub env: BTreeMap<String, String>,
    /// Working directory; `None` inherits the caller's.
    pub directory: Option<String>,
}

impl CommandSpec {
    pub fn new(section: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            command: command.into(),
            env: BTreeMap::new(),
            directory: None,
        }
    }

    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn with_directory(mut self, directory: impl Into<String>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    /// Representative program name, e.g. `ark` for `bash -c "/bin/ark --run"`.
    ///
    /// Falls back to the first word when nothing resolves, so `echo hi` is named
    /// `echo` and `VAR=value` is named `VAR=value`.
    pub fn command_name(&self) -> String {
        let command = self.command.trim();
        if command.is_empty() {
            return String::new();
        }

        if let Ok(tokens) = tokenize(command) {
            if let Some(real) = real_command(&tokens) {
                return command_display_name(&real).to_string();
            }
        }

        command
            .split_whitespace()
            .next()
            .map(|word| command_display_name(word).to_string())
            .unwrap_or_default()
    }

    /// `cd <dir> && NAME=value ... <command>`, ready to paste into a shell.
    pub fn to_bash_string(&self) -> String {
        let mut line = String::new();
        for (name, value) in &self.env {
            line.push_str(&format!("{name}={} ", quote_word(value)));
        }
        line.push_str(&self.command);

        match &self.directory {
            Some(dir) => format!("cd {} && {line}", quote_word(dir)),
            None => line,
        }
    }

    /// Derive a descriptor with `extra` arguments inserted right after the program.
    ///
    /// `extra` is tokenized like a command line and every word is quoted, so user
    /// input cannot introduce new statements. Leading inline `NAME=value` words stay
    /// in front of the program.
    pub fn with_extra_args(&self, extra: &str) -> ReplayResult<CommandSpec> {
        let extra = tokenize(extra)?
            .iter()
            .map(|token| shell_quote(token.as_str()))
            .collect::<Vec<_>>()
            .join(" ");
        if extra.is_empty() {
            return Ok(self.clone());
        }

        let command = self.command.trim();
        let split = program_end(command)?;
        let (head, tail) = command.split_at(split);
        let joined = format!("{} {} {}", head.trim_end(), extra, tail.trim_start());

        Ok(CommandSpec {
            command: joined.trim().to_string(),
            ..self.clone()
        })
    }
}

/// Byte offset just past the first word that is not an inline assignment.
fn program_end(command: &str) -> ReplayResult<usize> {
    let mut pos = 0;
    for token in tokenize(command)? {
        let rest = &command[pos..];
        pos += rest.len() - rest.trim_start().len() + token.raw().len();
        if !token.is_env_assignment() {
            break;
        }
    }
    Ok(pos.min(command.len()))
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let preview: String = self.command.chars().take(50).collect();
        write!(
            f,
            "Command(name='{}', section='{}', cmd='{}...', env_vars={}, dir='{}')",
            self.command_name(),
            self.section,
            preview,
            self.env.len(),
            self.directory.as_deref().unwrap_or("none")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_command_name() {
        let cmd = CommandSpec::new("s", "/path/to/c2abc arg1");
        assert_eq!(cmd.command_name(), "c2abc");
    }

    #[test]
    fn wrapped_bash_command_name() {
        let cmd = CommandSpec::new("s", "bash -ce /media/bin/ark_aot --flag; /media/bin/ark --run");
        assert_eq!(cmd.command_name(), "ark_aot");
    }

    #[test]
    fn wrapped_sh_command_name() {
        let cmd = CommandSpec::new("s", "sh -c \"/media/bin/ark --arg\"");
        assert_eq!(cmd.command_name(), "ark");
    }

    #[test]
    fn echo_only_falls_back() {
        let cmd = CommandSpec::new("s", "echo Exit code: $?");
        assert_eq!(cmd.command_name(), "echo");
    }

    #[test]
    fn only_env_assignment() {
        let cmd = CommandSpec::new("s", "VAR=value");
        assert_eq!(cmd.command_name(), "VAR=value");
    }

    #[test]
    fn broken_quoting_falls_back_to_first_word() {
        let cmd = CommandSpec::new("s", "/opt/bin/tool 'unterminated");
        assert_eq!(cmd.command_name(), "tool");
        assert_eq!(CommandSpec::new("s", "   ").command_name(), "");
    }

    #[test]
    fn bash_string_with_env_and_directory() {
        let mut env = BTreeMap::new();
        env.insert("B".to_string(), "two words".to_string());
        env.insert("A".to_string(), "1".to_string());
        let cmd = CommandSpec::new("s", "/bin/tool -x")
            .with_env(env)
            .with_directory("/tmp/work");
        assert_eq!(
            cmd.to_bash_string(),
            "cd /tmp/work && A=1 B='two words' /bin/tool -x"
        );
        assert_eq!(CommandSpec::new("s", "ls").to_bash_string(), "ls");
    }

    #[test]
    fn extra_args_follow_the_program() {
        let cmd = CommandSpec::new("s", "/bin/ark --run  f.abc").with_directory("/d");
        let derived = cmd.with_extra_args("--verbose 'a b'").unwrap();
        assert_eq!(derived.command, "/bin/ark --verbose 'a b' --run  f.abc");
        assert_eq!(derived.directory.as_deref(), Some("/d"));
        assert_eq!(cmd.command, "/bin/ark --run  f.abc");
    }

    #[test]
    fn extra_args_skip_inline_assignments() {
        let cmd = CommandSpec::new("s", "VAR=1 /bin/tool -x");
        let derived = cmd.with_extra_args("-v").unwrap();
        assert_eq!(derived.command, "VAR=1 /bin/tool -v -x");

        let bare = CommandSpec::new("s", "/bin/tool");
        assert_eq!(bare.with_extra_args("-v").unwrap().command, "/bin/tool -v");
    }

    #[test]
    fn extra_args_skip_quoted_assignments() {
        let cmd = CommandSpec::new("s", "A='x y' /bin/tool -q");
        assert_eq!(
            cmd.with_extra_args("-v").unwrap().command,
            "A='x y' /bin/tool -v -q"
        );

        let cmd = CommandSpec::new("s", "A=\"x y\" B=1 '/opt/my tool' -q");
        assert_eq!(
            cmd.with_extra_args("-v").unwrap().command,
            "A=\"x y\" B=1 '/opt/my tool' -v -q"
        );
        assert!(CommandSpec::new("s", "/bin/tool 'open").with_extra_args("-v").is_err());
    }

    #[test]
    fn extra_args_are_quoted() {
        let cmd = CommandSpec::new("s", "/bin/tool");
        let derived = cmd.with_extra_args("--name=$HOME").unwrap();
        assert_eq!(derived.command, "/bin/tool '--name=$HOME'");
        assert!(cmd.with_extra_args("'oops").is_err());
        assert_eq!(cmd.with_extra_args("  ").unwrap(), cmd);
    }

    #[test]
    fn display_summary() {
        let cmd = CommandSpec::new("compile", "/bin/ark --run");
        assert_eq!(
            cmd.to_string(),
            "Command(name='ark', section='compile', cmd='/bin/ark --run...', env_vars=0, dir='none')"
        );
    }
}
