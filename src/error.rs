//! Error types and reporting for log parsing and replay.
//!
//! Functions return `ReplayError` instead of bare strings. An error carries:
//! - Error kind (tokenizing, wrapper nesting, selection, execution, etc.)
//! - Human-readable message
//! - Optional context about what input caused the error
//! - Optional character position for pointing to the problem location

use std::fmt;

/// Categorized error types for better diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed quoting or escaping in a command line
    Tokenize,
    /// Shell wrappers nested deeper than the unwrap limit
    Nesting,
    /// Log input could not be read
    Input,
    /// A run spec or pattern selected nothing usable
    Selection,
    /// Error running a command
    Execution,
    /// Error loading/parsing configuration
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::Tokenize => write!(f, "Tokenize error"),
            ErrorKind::Nesting => write!(f, "Nesting error"),
            ErrorKind::Input => write!(f, "Input error"),
            ErrorKind::Selection => write!(f, "Selection error"),
            ErrorKind::Execution => write!(f, "Execution error"),
            ErrorKind::Config => write!(f, "Config error"),
        }
    }
}

/// Rich error type with context information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayError {
    pub kind: ErrorKind,
    pub message: String,
    /// Additional context explaining what was being processed
    pub context: Option<String>,
    /// Character position in input where the error occurred
    pub position: Option<usize>,
}

impl ReplayError {
    /// Create a new error with just the kind and message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ReplayError {
            kind,
            message: message.into(),
            context: None,
            position: None,
        }
    }

    /// Add context string (e.g., "Close the quote opened here")
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add character position in input where error occurred
    pub fn with_position(mut self, pos: usize) -> Self {
        self.position = Some(pos);
        self
    }

    /// Format error with a snippet of the input showing where the problem is
    pub fn display_with_input(&self, input: &str) -> String {
        let mut msg = format!("{}: {}", self.kind, self.message);

        if let Some(pos) = self.position {
            let chars: Vec<char> = input.chars().collect();
            if pos < chars.len() {
                let start = pos.saturating_sub(15);
                let end = (pos + 15).min(chars.len());
                let snippet: String = chars[start..end].iter().collect();

                msg.push_str(&format!("\n  near: '{}'", snippet.replace('\n', "↵")));
                msg.push('\n');

                let offset = pos - start;
                msg.push_str(&format!("  {}{}", " ".repeat(offset + 9), "^"));
            } else {
                msg.push_str(&format!("\n  at position {} (end of input)", pos));
            }
        } else if let Some(context) = &self.context {
            msg.push_str(&format!("\n  hint: {}", context));
        }

        msg
    }

    /// Simplified display without input context
    pub fn display_simple(&self) -> String {
        let mut msg = format!("{}: {}", self.kind, self.message);
        if let Some(context) = &self.context {
            msg.push_str(&format!("\n  hint: {}", context));
        }
        msg
    }
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.display_simple())
    }
}

impl std::error::Error for ReplayError {}

/// Convenience type alias for Results with ReplayError
pub type ReplayResult<T> = Result<T, ReplayError>;
