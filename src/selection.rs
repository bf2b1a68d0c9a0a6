use glob::Pattern;

use crate::command::CommandSpec;
use crate::sections::parse_log;

/// Ordered commands recovered from one log, with glob-style selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSet {
    commands: Vec<CommandSpec>,
}

impl CommandSet {
    pub fn new(commands: Vec<CommandSpec>) -> Self {
        Self { commands }
    }

    pub fn parse(text: &str) -> Self {
        Self::new(parse_log(text))
    }

    pub fn push(&mut self, command: CommandSpec) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[CommandSpec] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CommandSpec> {
        self.commands.iter()
    }

    /// Commands whose section name matches a shell glob such as `*compile*`.
    pub fn by_section(&self, pattern: &str) -> Vec<&CommandSpec> {
        let matcher = Matcher::new(pattern);
        self.commands
            .iter()
            .filter(|cmd| matcher.matches(&cmd.section))
            .collect()
    }

    /// Commands whose resolved program name matches a shell glob such as `ark*`.
    pub fn by_name(&self, pattern: &str) -> Vec<&CommandSpec> {
        let matcher = Matcher::new(pattern);
        self.commands
            .iter()
            .filter(|cmd| matcher.matches(&cmd.command_name()))
            .collect()
    }

    /// Unique section names in first-seen order.
    pub fn sections(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for cmd in &self.commands {
            if !seen.contains(&cmd.section.as_str()) {
                seen.push(&cmd.section);
            }
        }
        seen
    }

    /// Unique program names in first-seen order.
    pub fn command_names(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for cmd in &self.commands {
            let name = cmd.command_name();
            if !seen.contains(&name) {
                seen.push(name);
            }
        }
        seen
    }

    pub fn to_bash_script(&self) -> String {
        let mut lines = vec!["#!/bin/bash".to_string(), String::new()];
        for cmd in &self.commands {
            lines.push(format!("# Section: {}", cmd.section));
            lines.push(cmd.to_bash_string());
            lines.push(String::new());
        }
        lines.join("\n")
    }
}

impl<'a> IntoIterator for &'a CommandSet {
    type Item = &'a CommandSpec;
    type IntoIter = std::slice::Iter<'a, CommandSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

impl std::ops::Index<usize> for CommandSet {
    type Output = CommandSpec;

    fn index(&self, index: usize) -> &CommandSpec {
        &self.commands[index]
    }
}

/// A glob pattern, or an exact string when the pattern does not compile.
enum Matcher {
    Glob(Pattern),
    Literal(String),
}

impl Matcher {
    fn new(pattern: &str) -> Self {
        match Pattern::new(pattern) {
            Ok(glob) => Matcher::Glob(glob),
            Err(err) => {
                log::debug!("select event=literal-pattern pattern={pattern} err={err}");
                Matcher::Literal(pattern.to_string())
            }
        }
    }

    fn matches(&self, candidate: &str) -> bool {
        match self {
            Matcher::Glob(glob) => glob.matches(candidate),
            Matcher::Literal(text) => text == candidate,
        }
    }
}
