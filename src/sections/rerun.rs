use std::collections::BTreeMap;

use log::debug;

use crate::command::CommandSpec;

const CONTINUATION: &str = "\\\\";

/// Parse the payload of a `----------rerun:` block into a single command.
///
/// `cd` lines set the directory (the last one wins), `NAME=value` lines before any
/// command text become environment, and every other line is command text.
pub fn parse_rerun_block(payload: &str, section: &str) -> Option<CommandSpec> {
    let mut env = BTreeMap::new();
    let mut parts: Vec<&str> = Vec::new();
    let mut directory = None;

    for raw in payload.lines() {
        let mut line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(stripped) = line.strip_suffix(CONTINUATION) {
            line = stripped.trim();
        }

        if let Some(rest) = line.strip_prefix("cd ") {
            let dir = rest.trim().trim_end_matches(&[' ', '&'][..]);
            directory = Some(dir.to_string());
            continue;
        }

        if parts.is_empty() {
            if let Some((name, value)) = assignment(line) {
                env.insert(name.to_string(), value.to_string());
                continue;
            }
        }

        parts.push(line);
    }

    if parts.is_empty() {
        debug!("parse event=rerun-empty section={section}");
        return None;
    }

    Some(CommandSpec {
        section: section.to_string(),
        command: parts.join(" "),
        env,
        directory,
    })
}

/// `NAME=value` lines: no leading `/` or `-`, no space before the first `=`.
fn assignment(line: &str) -> Option<(&str, &str)> {
    if line.starts_with('/') || line.starts_with('-') {
        return None;
    }
    let (name, value) = line.split_once('=')?;
    if name.contains(' ') {
        return None;
    }
    Some((name.trim(), value.trim()))
}
