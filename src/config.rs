use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use jtr_replay::{is_valid_var_name, ErrorKind, ReplayError, ReplayResult};
use log::debug;

use crate::colors::{apply_color_setting, ColorConfig};

pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_SHELL: &str = "sh";
const RC_FILE: &str = ".jtr_replayrc";

#[derive(Clone, Debug)]
pub struct ReplayConfig {
    pub timeout_secs: u64,
    pub raw_output: bool,
    pub shell: String,
    pub colors: ColorConfig,
    /// `export` lines from the rc file, applied on top of each command's env.
    pub extra_env: BTreeMap<String, String>,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            raw_output: false,
            shell: DEFAULT_SHELL.to_string(),
            colors: ColorConfig::default(),
            extra_env: BTreeMap::new(),
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    let home = env::var("HOME").ok()?;
    if home.is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(RC_FILE))
}

/// Read an rc file into `config`. A missing file is only an error when the path was
/// given explicitly. Bad lines are reported and skipped.
pub fn load_config(path: &Path, explicit: bool, config: &mut ReplayConfig) -> ReplayResult<()> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound && !explicit => {
            debug!("config event=missing path={}", path.display());
            return Ok(());
        }
        Err(err) => {
            return Err(ReplayError::new(
                ErrorKind::Config,
                format!("cannot read '{}': {err}", path.display()),
            ))
        }
    };

    for diagnostic in apply_config_text(&content, config) {
        eprintln!("{diagnostic}");
    }
    debug!("config event=loaded path={}", path.display());
    Ok(())
}

/// Apply rc file text, returning one `config:<line>: <message>` entry per skipped line.
pub fn apply_config_text(content: &str, config: &mut ReplayConfig) -> Vec<String> {
    let mut diagnostics = Vec::new();
    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let result = if let Some(rest) = line.strip_prefix("export ") {
            parse_export(rest, &mut config.extra_env)
        } else if let Some((key, value)) = line.split_once('=') {
            apply_setting(config, key.trim(), strip_quotes(value.trim()))
        } else {
            Err("unrecognized directive".to_string())
        };
        if let Err(err) = result {
            diagnostics.push(format!("config:{}: {err}", idx + 1));
        }
    }
    diagnostics
}

/// Environment overrides sit between the rc file and the command line.
pub fn apply_env_overrides<F>(config: &mut ReplayConfig, lookup: F) -> Vec<ReplayError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut errors = Vec::new();
    for (var, key) in [
        ("JTR_REPLAY_TIMEOUT", "timeout"),
        ("JTR_REPLAY_SHELL", "shell"),
        ("JTR_REPLAY_RAW_OUTPUT", "raw_output"),
    ] {
        let Some(value) = lookup(var) else {
            continue;
        };
        if let Err(err) = apply_setting(config, key, value.trim()) {
            errors.push(ReplayError::new(ErrorKind::Config, err).with_context(var));
        }
    }
    errors
}

fn apply_setting(config: &mut ReplayConfig, key: &str, value: &str) -> Result<(), String> {
    match key {
        "timeout" => {
            config.timeout_secs = value
                .parse()
                .map_err(|_| format!("invalid timeout '{value}'"))?;
        }
        "raw_output" => config.raw_output = parse_bool(value)?,
        "shell" => {
            if value.is_empty() {
                return Err("shell is empty".to_string());
            }
            config.shell = value.to_string();
        }
        _ => {
            if let Some(color_key) = key.strip_prefix("color.") {
                return apply_color_setting(&mut config.colors, color_key, value);
            }
            return Err(format!("unknown key '{key}'"));
        }
    }
    Ok(())
}

fn parse_export(input: &str, env: &mut BTreeMap<String, String>) -> Result<(), String> {
    let (name, value) = input
        .trim()
        .split_once('=')
        .ok_or_else(|| "export missing '='".to_string())?;
    let name = name.trim();
    if !is_valid_var_name(name) {
        return Err(format!("invalid variable name '{name}'"));
    }
    env.insert(name.to_string(), strip_quotes(value.trim()).to_string());
    Ok(())
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(format!("invalid boolean '{value}'")),
    }
}

fn strip_quotes(input: &str) -> &str {
    let bytes = input.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &input[1..bytes.len() - 1];
        }
    }
    input
}
