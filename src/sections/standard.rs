use std::collections::BTreeMap;

use log::warn;

use crate::command::CommandSpec;
use crate::parse::split_command_line;
use crate::sections::COMMAND_IS_MARKER;
use crate::utils::is_env_assignment;

const COMMAND_PREFIX: &str = "command:";
const ENVIRONMENT_HEADER: &str = "Command environment is:";
const DIRECTORY_PREFIX: &str = "Execution directory is:";

/// Parse a `Command is:` style section body.
///
/// The `Command is:` line wins over `command:` lines. When it splits into nothing
/// (for instance it only echoes), the raw line is kept as a single command so the
/// section stays visible.
pub fn parse_standard_format(body: &str, section: &str) -> Vec<CommandSpec> {
    let lines: Vec<&str> = body.lines().map(str::trim).collect();
    let mut primary: Option<&str> = None;
    let mut candidates: Vec<&str> = Vec::new();
    let mut env = BTreeMap::new();
    let mut directory: Option<&str> = None;

    let mut idx = 0;
    while idx < lines.len() {
        let line = lines[idx];

        if let Some(rest) = line.strip_prefix(COMMAND_PREFIX) {
            candidates.push(rest.trim());
        }

        if let Some(rest) = line.strip_prefix(COMMAND_IS_MARKER) {
            primary = Some(rest.trim());
        } else if line == ENVIRONMENT_HEADER {
            idx += 1;
            while idx < lines.len() {
                let env_line = lines[idx];
                if env_line.is_empty() || env_line.starts_with(DIRECTORY_PREFIX) {
                    break;
                }
                if !is_env_assignment(env_line) {
                    break;
                }
                if let Some((name, value)) = env_line.split_once('=') {
                    env.insert(name.trim().to_string(), value.trim().to_string());
                }
                idx += 1;
            }
            // The line that ended the block still needs its own handling.
            continue;
        } else if let Some(rest) = line.strip_prefix(DIRECTORY_PREFIX) {
            directory = Some(rest.trim());
        }

        idx += 1;
    }

    let primary = primary.filter(|line| !line.is_empty());
    let sources = match primary {
        Some(line) => vec![line],
        None => candidates,
    };

    let mut commands = Vec::new();
    for source in sources {
        match split_command_line(source, section, &env, directory) {
            Ok(split) => commands.extend(split),
            Err(err) => warn!(
                "parse event=split-failed section={section} err={}",
                err.display_with_input(source)
            ),
        }
    }

    if commands.is_empty() {
        if let Some(raw) = primary {
            commands.push(CommandSpec {
                section: section.to_string(),
                command: raw.to_string(),
                env,
                directory: directory.map(str::to_string),
            });
        }
    }

    commands
}
