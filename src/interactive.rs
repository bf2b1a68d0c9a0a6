use std::io::{self, Write};

use jtr_replay::{CommandSet, CommandSpec, ErrorKind, ReplayError, ReplayResult};
use log::debug;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::report::Reporter;

const PROMPT: &str = "Execute? (y/n/s/q) [y=yes, n=no, s=show details, q=quit]: ";

/// Where answers to the execute prompt come from. `None` means end of input.
pub trait PromptSource {
    fn read_choice(&mut self, prompt: &str) -> io::Result<Option<String>>;
}

pub struct EditorPrompt {
    editor: DefaultEditor,
}

impl PromptSource for EditorPrompt {
    fn read_choice(&mut self, prompt: &str) -> io::Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(io::Error::other(err)),
        }
    }
}

pub struct StdinPrompt;

impl PromptSource for StdinPrompt {
    fn read_choice(&mut self, prompt: &str) -> io::Result<Option<String>> {
        let mut stdout = io::stdout();
        write!(stdout, "{prompt}")?;
        stdout.flush()?;
        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}

/// Line editing on a terminal, plain line reads otherwise.
pub fn open_prompt() -> Box<dyn PromptSource> {
    let interactive = unsafe { libc::isatty(libc::STDIN_FILENO) == 1 };
    if interactive {
        match DefaultEditor::new() {
            Ok(editor) => return Box::new(EditorPrompt { editor }),
            Err(err) => debug!("prompt event=editor-failed err={err}"),
        }
    }
    Box::new(StdinPrompt)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Choice {
    Yes,
    No,
    Show,
    Quit,
    Invalid,
}

impl Choice {
    fn parse(answer: &str) -> Self {
        match answer.trim().to_lowercase().as_str() {
            "y" | "" => Choice::Yes,
            "n" => Choice::No,
            "s" => Choice::Show,
            "q" => Choice::Quit,
            _ => Choice::Invalid,
        }
    }
}

/// Ask before each command. In raw mode every command runs without a prompt.
pub fn execute_interactively<W: Write>(
    reporter: &mut Reporter<W>,
    set: &CommandSet,
    prompts: &mut dyn PromptSource,
) -> ReplayResult<()> {
    reporter.heading("Interactive Command Execution")?;
    for (idx, cmd) in set.iter().enumerate() {
        reporter.line(format!("\n{}. Section: {}", idx + 1, cmd.section))?;
        reporter.line(format!("   Command: {}", cmd.to_bash_string()))?;

        if reporter.is_raw() {
            reporter.run(cmd, false);
            continue;
        }

        loop {
            let answer = prompts.read_choice(PROMPT).map_err(|err| {
                ReplayError::new(ErrorKind::Input, format!("cannot read answer: {err}"))
            })?;
            let Some(answer) = answer else {
                debug!("prompt event=eof index={}", idx + 1);
                return Ok(());
            };
            match Choice::parse(&answer) {
                Choice::Quit => {
                    reporter.line("Quitting...")?;
                    return Ok(());
                }
                Choice::No => {
                    reporter.line("Skipped.")?;
                    break;
                }
                Choice::Show => show_details(reporter, cmd)?,
                Choice::Yes => {
                    run_and_report(reporter, cmd)?;
                    break;
                }
                Choice::Invalid => {
                    reporter.line("Invalid choice. Please enter y, n, s, or q.")?;
                }
            }
        }
    }
    Ok(())
}

fn show_details<W: Write>(reporter: &mut Reporter<W>, cmd: &CommandSpec) -> ReplayResult<()> {
    let env: Vec<String> = cmd
        .env
        .iter()
        .map(|(name, value)| format!("'{name}': '{value}'"))
        .collect();
    reporter.line(format!("   Section: {}", cmd.section))?;
    reporter.line(format!("   Command: {}", cmd.command))?;
    reporter.line(format!("   Env vars: {{{}}}", env.join(", ")))?;
    reporter.line(format!(
        "   Directory: {}",
        cmd.directory.as_deref().unwrap_or("none")
    ))
}

fn run_and_report<W: Write>(reporter: &mut Reporter<W>, cmd: &CommandSpec) -> ReplayResult<()> {
    reporter.line("Executing...")?;
    let result = reporter.run(cmd, true);
    reporter.line(format!("Return code: {}", result.status))?;
    if !result.stdout.is_empty() {
        reporter.line("STDOUT:")?;
        reporter.line(&result.stdout)?;
    }
    if !result.stderr.is_empty() {
        reporter.line("STDERR:")?;
        reporter.line(&result.stderr)?;
    }
    let verdict = if result.success() {
        reporter.colors().success("✓ Command completed successfully")
    } else {
        reporter.colors().failure("✗ Command failed")
    };
    reporter.line(verdict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::ColorConfig;
    use crate::execution::ExecOptions;
    use std::collections::VecDeque;

    struct Scripted(VecDeque<&'static str>);

    impl PromptSource for Scripted {
        fn read_choice(&mut self, _prompt: &str) -> io::Result<Option<String>> {
            Ok(self.0.pop_front().map(str::to_string))
        }
    }

    fn drive(answers: &[&'static str], set: &CommandSet) -> String {
        let mut reporter =
            Reporter::new(Vec::new(), false, ColorConfig::default(), ExecOptions::default());
        let mut prompts = Scripted(answers.iter().copied().collect());
        execute_interactively(&mut reporter, set, &mut prompts).unwrap();
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    fn sample() -> CommandSet {
        CommandSet::new(vec![
            CommandSpec::new("first", "echo hello"),
            CommandSpec::new("second", "exit 2"),
        ])
    }

    #[test]
    fn yes_and_no() {
        let out = drive(&["y", "n"], &sample());
        assert!(out.contains("Return code: 0"));
        assert!(out.contains("STDOUT:\nhello\n"));
        assert!(out.contains("✓ Command completed successfully"));
        assert!(out.contains("Skipped."));
        assert!(!out.contains("Return code: 2"));
    }

    #[test]
    fn empty_answer_runs_and_failure_is_reported() {
        let out = drive(&["n", "\n"], &sample());
        assert!(out.contains("Return code: 2"));
        assert!(out.contains("✗ Command failed"));
    }

    #[test]
    fn show_reprompts_and_invalid_reprompts() {
        let out = drive(&["s", "what", "q"], &sample());
        assert!(out.contains("   Env vars: {}"));
        assert!(out.contains("   Directory: none"));
        assert!(out.contains("Invalid choice. Please enter y, n, s, or q."));
        assert!(out.contains("Quitting..."));
        assert!(!out.contains("2. Section: second"));
    }

    #[test]
    fn end_of_input_stops() {
        let out = drive(&[], &sample());
        assert!(out.contains("1. Section: first"));
        assert!(!out.contains("2. Section: second"));
    }

    #[test]
    fn raw_mode_runs_without_prompting() {
        let mut reporter =
            Reporter::new(Vec::new(), true, ColorConfig::default(), ExecOptions::default());
        let set = CommandSet::new(vec![CommandSpec::new("s", "true")]);
        let mut prompts = Scripted(VecDeque::new());
        execute_interactively(&mut reporter, &set, &mut prompts).unwrap();
        assert!(reporter.into_inner().is_empty());
    }

    #[test]
    fn choices() {
        assert_eq!(Choice::parse(" Y "), Choice::Yes);
        assert_eq!(Choice::parse("Q"), Choice::Quit);
        assert_eq!(Choice::parse("yes"), Choice::Invalid);
    }
}
