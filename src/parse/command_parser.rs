use std::collections::BTreeMap;

use log::{debug, warn};

use crate::command::CommandSpec;
use crate::error::{ErrorKind, ReplayError};
use crate::parse::resolver::unwrap_shell;
use crate::parse::{
    command_display_name, join_quoted, real_command, tokenize, Token, NO_OP_COMMANDS,
};

// Bound wrapper nesting so `bash -c "sh -c ..."` chains cannot recurse forever.
pub const MAX_WRAPPER_DEPTH: usize = 32;

/// Split one recorded command line into the real commands it runs.
///
/// Statements joined by `;`, `&&` or `||` become separate descriptors, `bash`/`sh`
/// wrappers are unwrapped, and statements that run nothing (pure assignments or
/// `echo`) are dropped. Every descriptor shares `section`, `env` and `directory`.
///
/// Only a tokenization failure of `line` itself is returned; broken statements nested
/// inside a wrapper are skipped.
pub fn split_command_line(
    line: &str,
    section: &str,
    env: &BTreeMap<String, String>,
    directory: Option<&str>,
) -> Result<Vec<CommandSpec>, ReplayError> {
    let tokens = tokenize(line)?;
    let mut commands = Vec::new();

    for group in split_tokens(tokens) {
        let Some(real) = real_command(&group) else {
            debug!("split event=drop reason=no-command section={section}");
            continue;
        };
        let name = command_display_name(&real);
        if NO_OP_COMMANDS
            .iter()
            .any(|no_op| name.eq_ignore_ascii_case(no_op))
        {
            debug!("split event=drop reason=no-op name={name} section={section}");
            continue;
        }
        let text = join_quoted(&group);
        debug!("split event=command name={name} section={section}");
        commands.push(CommandSpec {
            section: section.to_string(),
            command: text.trim().to_string(),
            env: env.clone(),
            directory: directory.map(str::to_string),
        });
    }

    Ok(commands)
}

/// Group a token stream into final statements, unwrapping shell wrappers.
pub fn split_tokens(tokens: Vec<Token>) -> Vec<Vec<Token>> {
    split_at_depth(tokens, 0)
}

fn split_at_depth(tokens: Vec<Token>, depth: usize) -> Vec<Vec<Token>> {
    let mut commands = Vec::new();
    let mut current = Vec::new();

    for token in tokens {
        if token.is_separator() {
            if !current.is_empty() {
                expand_into(&mut commands, std::mem::take(&mut current), depth);
            }
            continue;
        }
        current.push(token);
    }

    if !current.is_empty() {
        expand_into(&mut commands, current, depth);
    }

    commands
}

fn expand_into(commands: &mut Vec<Vec<Token>>, group: Vec<Token>, depth: usize) {
    match expand_wrapped(group, depth) {
        Ok(expanded) => commands.extend(expanded),
        Err(err) => warn!("split event=drop-statement err={}", err.display_simple()),
    }
}

fn expand_wrapped(group: Vec<Token>, depth: usize) -> Result<Vec<Vec<Token>>, ReplayError> {
    let mut env_prefix = group;
    let split = env_prefix
        .iter()
        .position(|token| !token.is_env_assignment())
        .unwrap_or(env_prefix.len());
    let rest = env_prefix.split_off(split);

    let Some(first) = rest.first() else {
        return Ok(Vec::new());
    };
    if !first.is_shell_wrapper() {
        env_prefix.extend(rest);
        return Ok(vec![env_prefix]);
    }

    let Some(inner) = unwrap_shell(&rest) else {
        return Ok(Vec::new());
    };
    if depth >= MAX_WRAPPER_DEPTH {
        return Err(ReplayError::new(
            ErrorKind::Nesting,
            format!("Shell wrappers nested deeper than {MAX_WRAPPER_DEPTH} levels"),
        )
        .with_context(inner));
    }
    let inner_tokens = tokenize(&inner).map_err(|err| err.with_context(inner.clone()))?;

    Ok(split_at_depth(inner_tokens, depth + 1)
        .into_iter()
        .filter(|inner| !inner.is_empty())
        .map(|inner| {
            let mut command = env_prefix.clone();
            command.extend(inner);
            command
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn split(line: &str) -> Vec<CommandSpec> {
        split_command_line(line, "sec", &BTreeMap::new(), None).unwrap()
    }

    fn names(commands: &[CommandSpec]) -> Vec<String> {
        commands.iter().map(CommandSpec::command_name).collect()
    }

    #[test]
    fn split_bash_chain_drops_echo() {
        let commands = split(
            "bash -ce \"/bin/ark_aot --compile f.abc; /bin/ark --run f.abc; echo Exit code: $?\"",
        );
        assert_eq!(names(&commands), vec!["ark_aot", "ark"]);
        assert_eq!(commands[0].command, "/bin/ark_aot --compile f.abc");
        assert_eq!(commands[1].command, "/bin/ark --run f.abc");
    }

    #[test]
    fn split_unquoted_bash_chain() {
        let commands = split(
            "bash -ce /media/bin/ark_aot --compile file.abc; /media/bin/ark --run file.abc; echo Exit code: $?",
        );
        assert_eq!(names(&commands), vec!["ark_aot", "ark"]);
    }

    #[test]
    fn split_sh_command() {
        let commands = split("sh -c \"/media/bin/ark --arg\"");
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].command, "/media/bin/ark --arg");
        assert_eq!(commands[0].command_name(), "ark");
    }

    #[test]
    fn split_direct_command() {
        let commands = split("/media/bin/c2abc input.abc");
        assert_eq!(names(&commands), vec!["c2abc"]);
    }

    #[test]
    fn separators_and_operators() {
        let commands = split("a && b || c ; d");
        assert_eq!(names(&commands), vec!["a", "b", "c", "d"]);

        let commands = split("grep x log | wc -l");
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].command, "grep x log | wc -l");

        let commands = split("a ; ; b ;");
        assert_eq!(names(&commands), vec!["a", "b"]);
    }

    #[test]
    fn env_prefix_applies_to_every_unwrapped_command() {
        let commands = split("A=1 B=2 bash -c \"/bin/x; /bin/y --z\"");
        let texts: Vec<_> = commands.iter().map(|c| c.command.as_str()).collect();
        assert_eq!(texts, vec!["A=1 B=2 /bin/x", "A=1 B=2 /bin/y --z"]);
    }

    #[test]
    fn inline_env_stays_in_command_text() {
        let commands = split("VAR=1 /bin/tool -x");
        assert_eq!(commands[0].command, "VAR=1 /bin/tool -x");
        assert_eq!(commands[0].command_name(), "tool");
        assert!(commands[0].env.is_empty());
    }

    #[test]
    fn pure_assignments_are_dropped() {
        assert!(split("A=1 B=2").is_empty());
        assert!(split("A=1; B=2 && /bin/x").len() == 1);
    }

    #[test]
    fn sole_echo_is_dropped() {
        assert!(split("echo Exit code: $?").is_empty());
        assert!(split("/bin/echo hi").is_empty());
        assert!(split("bash -c 'echo only'").is_empty());
    }

    #[test]
    fn nested_wrappers() {
        let commands = split("bash -c 'sh -c \"/a/one; /a/two\"; /a/three'");
        assert_eq!(names(&commands), vec!["one", "two", "three"]);
    }

    #[test]
    fn quoted_arguments_stay_quoted() {
        let commands = split("sh -c \"/bin/grep 'a b' file\"");
        assert_eq!(commands[0].command, "/bin/grep 'a b' file");
        let commands = split("/bin/grep 'x;y' file");
        assert_eq!(commands[0].command, "/bin/grep 'x;y' file");
    }

    #[test]
    fn quoted_env_prefix_stays_an_assignment() {
        let commands = split("A=\"x y\" bash -c \"/bin/tool -q\"");
        assert_eq!(commands[0].command, "A='x y' /bin/tool -q");
        assert_eq!(commands[0].command_name(), "tool");

        let commands = split("A=\"$HOME/x\" /bin/tool");
        assert_eq!(commands[0].command, "A=\"$HOME/x\" /bin/tool");
    }

    #[test]
    fn quoted_shell_characters_survive() {
        let commands = split("/bin/grep '#x' file; /bin/cat '$HOME' 'a>b' '*.c' a\\ b");
        let texts: Vec<_> = commands.iter().map(|c| c.command.as_str()).collect();
        assert_eq!(
            texts,
            vec!["/bin/grep '#x' file", "/bin/cat '$HOME' 'a>b' '*.c' a\\ b"]
        );

        let commands = split("bash -c \"/bin/echo2 \\\"$HOME\\\" '#x'\"");
        assert_eq!(commands[0].command, "/bin/echo2 \"$HOME\" '#x'");
    }

    #[test]
    fn carries_env_and_directory() {
        let mut env = BTreeMap::new();
        env.insert("OTHER".to_string(), "2".to_string());
        let commands = split_command_line("/bin/a; /bin/b", "s", &env, Some("/tmp")).unwrap();
        assert_eq!(commands.len(), 2);
        for command in &commands {
            assert_eq!(command.section, "s");
            assert_eq!(command.env, env);
            assert_eq!(command.directory.as_deref(), Some("/tmp"));
        }
    }

    #[test]
    fn broken_inner_statement_is_skipped() {
        let commands = split("sh -c \"/bin/a 'oops\"; /bin/b");
        assert_eq!(names(&commands), vec!["b"]);
    }

    #[test]
    fn broken_top_level_line_is_an_error() {
        let err = split_command_line("/bin/a 'oops", "s", &BTreeMap::new(), None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Tokenize);
    }

    #[test]
    fn wrapper_depth_is_bounded() {
        // Each unquoted wrapper layer consumes one `sh` word from the same line.
        let mut line = "sh ".repeat(MAX_WRAPPER_DEPTH + 1);
        line.push_str("/bin/deep");
        assert!(split(&line).is_empty());

        let mut line = "sh ".repeat(MAX_WRAPPER_DEPTH);
        line.push_str("/bin/deep");
        assert_eq!(names(&split(&line)), vec!["deep"]);
    }

    proptest! {
        #[test]
        fn splitting_is_idempotent(
            statements in prop::collection::vec(
                prop::collection::vec("[A-Za-z0-9_./-]{1,8}|'[a-z ;&|]{1,8}'", 1..5),
                1..4,
            ),
            wrap in any::<bool>(),
        ) {
            let line = statements
                .iter()
                .map(|words| format!("/bin/{}", words.join(" ")))
                .collect::<Vec<_>>()
                .join(" && ");
            let line = if wrap { format!("bash -c \"{line}\"") } else { line };
            for command in split(&line) {
                let again = split(&command.command);
                prop_assert_eq!(again.len(), 1);
                prop_assert_eq!(&again[0].command, &command.command);
            }
        }
    }
}
