use std::collections::BTreeMap;

use jtr_replay::{
    is_env_assignment, tokenize, CommandSet, ErrorKind, ReplayError, ReplayResult,
};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::run_spec::RunSpec;

/// One entry of an lldb `launch.json`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LaunchConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub request: String,
    pub name: String,
    pub program: String,
    pub args: Vec<String>,
    pub cwd: String,
    pub env: BTreeMap<String, String>,
}

impl LaunchConfig {
    pub fn to_json(&self) -> ReplayResult<String> {
        let mut buf = Vec::new();
        let mut ser =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        self.serialize(&mut ser).map_err(|err| {
            ReplayError::new(ErrorKind::Execution, format!("cannot render launch config: {err}"))
        })?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

#[derive(Debug)]
pub struct DebugTarget {
    pub config: LaunchConfig,
    /// How many commands matched; only the first is used.
    pub matches: usize,
}

/// Build the launch config for the first command whose name matches `spec.pattern`.
///
/// Extra args go before the command's own args, and leading `NAME=value` words join
/// the env.
pub fn launch_config(set: &CommandSet, spec: &RunSpec, current_dir: &str) -> ReplayResult<DebugTarget> {
    let matches = set.by_name(&spec.pattern);
    let Some(cmd) = matches.first() else {
        return Err(ReplayError::new(
            ErrorKind::Selection,
            format!("No command found matching pattern '{}'", spec.pattern),
        ));
    };

    let tokens = tokenize(&cmd.command)?;
    let mut env = cmd.env.clone();
    let mut words = tokens.iter().map(|token| token.as_str()).peekable();
    while let Some((name, value)) = words.peek().copied().and_then(inline_assignment) {
        env.insert(name.to_string(), value.to_string());
        words.next();
    }
    let program = words.next().ok_or_else(|| {
        ReplayError::new(
            ErrorKind::Selection,
            format!("Command in section '{}' has no program", cmd.section),
        )
    })?;

    let mut args: Vec<String> = tokenize(&spec.extra_args)?
        .iter()
        .map(|token| token.as_str().to_string())
        .collect();
    args.extend(words.map(str::to_string));

    Ok(DebugTarget {
        config: LaunchConfig {
            kind: "lldb".to_string(),
            request: "launch".to_string(),
            name: format!("Debug {}", cmd.command_name()),
            program: program.to_string(),
            args,
            cwd: cmd
                .directory
                .clone()
                .unwrap_or_else(|| current_dir.to_string()),
            env,
        },
        matches: matches.len(),
    })
}

fn inline_assignment(word: &str) -> Option<(&str, &str)> {
    if !is_env_assignment(word) {
        return None;
    }
    word.split_once('=')
}
