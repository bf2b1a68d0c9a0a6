//! Splitting test runner logs into `#section:` blocks.
//!
//! Each section body is recognized as either a rerun block (`----------rerun:`) or the
//! standard `Command is:` layout; anything else contributes no commands.
use log::debug;

use crate::command::CommandSpec;

mod rerun;
mod standard;

pub use rerun::parse_rerun_block;
pub use standard::parse_standard_format;

pub const SECTION_MARKER: &str = "#section:";
pub const RERUN_MARKER: &str = "----------rerun:";
pub const DASH_DELIMITER: &str = "----------";
pub const COMMAND_IS_MARKER: &str = "Command is:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section<'a> {
    pub name: &'a str,
    pub body: &'a str,
}

/// Find every `#section:<name>` marker and the body that follows it.
///
/// The name runs to the end of the marker line. Text before the first marker is
/// ignored, as are markers whose name is blank.
pub fn split_sections(text: &str) -> Vec<Section<'_>> {
    let mut markers = Vec::new();
    let mut search_from = 0;

    while let Some(found) = text[search_from..].find(SECTION_MARKER) {
        let marker_start = search_from + found;
        let name_start = marker_start + SECTION_MARKER.len();
        let name_end = text[name_start..]
            .find('\n')
            .map(|offset| name_start + offset)
            .unwrap_or(text.len());
        if name_end == name_start {
            // `#section:` directly followed by a newline is not a marker.
            search_from = name_start;
            continue;
        }
        markers.push((marker_start, name_start, name_end));
        search_from = name_end;
    }

    let mut sections = Vec::with_capacity(markers.len());
    for (idx, &(_, name_start, name_end)) in markers.iter().enumerate() {
        let body_end = markers
            .get(idx + 1)
            .map(|&(next_start, _, _)| next_start)
            .unwrap_or(text.len());
        let name = text[name_start..name_end].trim();
        if name.is_empty() {
            debug!("parse event=skip-section reason=blank-name offset={name_start}");
            continue;
        }
        sections.push(Section {
            name,
            body: &text[name_end..body_end],
        });
    }
    sections
}

/// Text between the rerun header and the next dash delimiter, trimmed.
pub fn rerun_payload(body: &str) -> Option<&str> {
    let header = body.find(RERUN_MARKER)? + RERUN_MARKER.len();
    let after_header = &body[header..];
    let payload_start = after_header.find(DASH_DELIMITER)? + DASH_DELIMITER.len();
    let payload = &after_header[payload_start..];
    let payload_end = payload.find(DASH_DELIMITER)?;
    Some(payload[..payload_end].trim())
}

/// Extract the commands recorded in one section body.
pub fn parse_section(section: &Section<'_>) -> Vec<CommandSpec> {
    if section.body.contains(RERUN_MARKER) {
        debug!("parse event=section name={} format=rerun", section.name);
        return match rerun_payload(section.body) {
            Some(payload) => parse_rerun_block(payload, section.name).into_iter().collect(),
            None => {
                debug!("parse event=rerun-unterminated name={}", section.name);
                Vec::new()
            }
        };
    }

    if section.body.contains(COMMAND_IS_MARKER) {
        debug!("parse event=section name={} format=standard", section.name);
        return parse_standard_format(section.body, section.name);
    }

    debug!("parse event=section name={} format=unrecognized", section.name);
    Vec::new()
}

/// Parse a whole log into commands, in section order.
pub fn parse_log(text: &str) -> Vec<CommandSpec> {
    let mut commands = Vec::new();
    for section in split_sections(text) {
        commands.extend(parse_section(&section));
    }
    debug!("parse event=done commands={}", commands.len());
    commands
}
