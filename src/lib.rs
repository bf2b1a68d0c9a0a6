//! Recover the shell commands a test run executed from its log output.
//!
//! The log is split into `#section:` blocks, each block's command line is split into
//! the statements it runs (unwrapping `bash -c` / `sh -c`), and every real command
//! becomes a [`CommandSpec`] that can be filtered, printed or replayed.
//!
//! Parsing never executes anything and never fails on malformed input: sections and
//! statements that cannot be understood are skipped.

mod command;
pub mod error;
mod parse;
mod sections;
#[cfg(feature = "selection")]
mod selection;
mod utils;

use std::collections::BTreeMap;

pub use command::CommandSpec;
pub use error::{ErrorKind, ReplayError, ReplayResult};
pub use parse::{
    command_display_name, join_quoted, join_raw, real_command, split_tokens, tokenize, Token,
    MAX_WRAPPER_DEPTH, NO_OP_COMMANDS, SEPARATORS, SHELL_WRAPPERS,
};
pub use sections::{
    parse_rerun_block, parse_section, parse_standard_format, rerun_payload, split_sections,
    Section,
};
#[cfg(feature = "selection")]
pub use selection::CommandSet;
pub use utils::{is_env_assignment, is_valid_var_name, shell_quote};

/// Parse a whole test runner log into commands, in log order.
pub fn parse_log(text: &str) -> Vec<CommandSpec> {
    sections::parse_log(text)
}

/// Split one raw command line into the real commands it runs.
pub fn split_command_line(
    line: &str,
    section: &str,
    env: &BTreeMap<String, String>,
    directory: Option<&str>,
) -> ReplayResult<Vec<CommandSpec>> {
    parse::split_command_line(line, section, env, directory)
}

/// Fuzz helper for log-level targets.
pub fn fuzz_parse_bytes(data: &[u8]) {
    let input = String::from_utf8_lossy(data);
    for cmd in sections::parse_log(&input) {
        let _ = cmd.command_name();
        let _ = cmd.to_bash_string();
    }
}

/// Fuzz helper for command-line targets.
pub fn fuzz_split_bytes(data: &[u8]) {
    let input = String::from_utf8_lossy(data);
    if let Ok(commands) = parse::split_command_line(&input, "fuzz", &BTreeMap::new(), None) {
        for cmd in commands {
            let _ = parse::split_command_line(&cmd.command, "fuzz", &BTreeMap::new(), None);
        }
    }
}
