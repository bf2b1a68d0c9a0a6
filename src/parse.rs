//! Shell-ish parsing of recorded command lines.
//!
//! - `tokenizer` turns a line into words and punctuation operators.
//! - `command_parser` splits statements on `;`, `&&`, `||` and unwraps `bash`/`sh`.
//! - `resolver` finds the program a statement actually runs.
use std::fmt;

mod command_parser;
mod resolver;
mod tokenizer;

pub use command_parser::{split_command_line, split_tokens, MAX_WRAPPER_DEPTH};
pub use resolver::{command_display_name, real_command};
pub use tokenizer::tokenize;

/// Shell programs whose only job is to run an inner command string.
pub const SHELL_WRAPPERS: [&str; 2] = ["bash", "sh"];

/// Operators that end one statement and start the next.
pub const SEPARATORS: [&str; 3] = [";", "&&", "||"];

/// Program names that carry no meaning when replayed.
pub const NO_OP_COMMANDS: [&str; 1] = ["echo"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A word written without quotes or backslashes.
    Word(String),
    /// A word that used quoting: `text` has the quotes removed, `raw` is the source.
    Quoted { text: String, raw: String },
    /// A run of unquoted `;`, `&`, `|`.
    Op(String),
}

impl Token {
    pub fn as_str(&self) -> &str {
        match self {
            Token::Word(text) | Token::Op(text) | Token::Quoted { text, .. } => text,
        }
    }

    /// The word or operator as it was written.
    pub fn raw(&self) -> &str {
        match self {
            Token::Word(text) | Token::Op(text) => text,
            Token::Quoted { raw, .. } => raw,
        }
    }

    fn word(&self) -> Option<&str> {
        match self {
            Token::Word(text) | Token::Quoted { text, .. } => Some(text),
            Token::Op(_) => None,
        }
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, Token::Op(op) if SEPARATORS.contains(&op.as_str()))
    }

    /// `NAME=value` with the name and `=` unquoted; quoting in the value is fine.
    pub fn is_env_assignment(&self) -> bool {
        match self {
            Token::Word(word) => crate::utils::is_env_assignment(word),
            Token::Quoted { text, raw } => match text.split_once('=') {
                Some((name, _)) => {
                    crate::utils::is_valid_var_name(name) && raw.starts_with(&format!("{name}="))
                }
                None => false,
            },
            Token::Op(_) => false,
        }
    }

    pub fn is_shell_wrapper(&self) -> bool {
        self.word()
            .is_some_and(|word| SHELL_WRAPPERS.contains(&crate::utils::base_name(word)))
    }

    /// Shell text that reproduces this token when run.
    ///
    /// Quoted words keep their source quoting, except assignments with a literal value,
    /// which become `NAME='value'`.
    pub fn render(&self) -> String {
        match self {
            Token::Word(text) => crate::utils::quote_word(text),
            Token::Op(op) => op.clone(),
            Token::Quoted { text, raw } => {
                if self.is_env_assignment() {
                    if let Some((name, value)) = text.split_once('=') {
                        let raw_value = &raw[name.len() + 1..];
                        if !raw_value.contains(['$', '`']) {
                            return format!("{name}={}", crate::utils::shell_quote(value));
                        }
                    }
                }
                raw.clone()
            }
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Join tokens with single spaces, keeping the quoting each word was written with.
pub fn join_quoted(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(Token::render)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Join tokens with single spaces, exactly as they were written.
pub fn join_raw(tokens: &[Token]) -> String {
    tokens.iter().map(Token::raw).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
pub(crate) fn words(tokens: &[Token]) -> Vec<&str> {
    tokens.iter().map(Token::as_str).collect()
}
