#[derive(Clone, Debug)]
pub struct ColorConfig {
    pub enabled: bool,
    pub success: String,
    pub failure: String,
    pub heading: String,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            success: "green".to_string(),
            failure: "red".to_string(),
            heading: "bold".to_string(),
        }
    }
}

impl ColorConfig {
    pub fn success(&self, text: &str) -> String {
        self.paint(&self.success, text)
    }

    pub fn failure(&self, text: &str) -> String {
        self.paint(&self.failure, text)
    }

    pub fn heading(&self, text: &str) -> String {
        self.paint(&self.heading, text)
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }
        let code = resolve_color(color);
        if code.is_empty() {
            text.to_string()
        } else {
            format!("{code}{text}\x1b[0m")
        }
    }
}

pub fn resolve_color(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return String::new();
    }
    if let Some(rest) = trimmed.strip_prefix("ansi:") {
        return rest.to_string();
    }
    if trimmed.contains("\x1b") {
        return trimmed.to_string();
    }
    match trimmed.to_lowercase().as_str() {
        "black" => "\x1b[30m",
        "red" => "\x1b[31m",
        "green" => "\x1b[32m",
        "yellow" => "\x1b[33m",
        "blue" => "\x1b[34m",
        "magenta" => "\x1b[35m",
        "cyan" => "\x1b[36m",
        "white" => "\x1b[37m",
        "bright_black" | "gray" | "grey" => "\x1b[90m",
        "bright_red" => "\x1b[91m",
        "bright_green" => "\x1b[92m",
        "bright_yellow" => "\x1b[93m",
        "bright_blue" => "\x1b[94m",
        "bright_magenta" => "\x1b[95m",
        "bright_cyan" => "\x1b[96m",
        "bright_white" => "\x1b[97m",
        "bold" => "\x1b[1m",
        "dim" => "\x1b[2m",
        _ => "",
    }
    .to_string()
}

pub fn apply_color_setting(config: &mut ColorConfig, key: &str, value: &str) -> Result<(), String> {
    match key {
        "success" => config.success = value.to_string(),
        "failure" => config.failure = value.to_string(),
        "heading" => config.heading = value.to_string(),
        _ => return Err(format!("unknown color key '{key}'")),
    }
    Ok(())
}

/// Colors only make sense on a terminal, and `NO_COLOR` always wins.
pub fn colors_enabled(no_color: Option<String>) -> bool {
    if no_color.is_some_and(|value| !value.is_empty()) {
        return false;
    }
    unsafe { libc::isatty(libc::STDOUT_FILENO) == 1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_and_raw_colors() {
        assert_eq!(resolve_color("green"), "\x1b[32m");
        assert_eq!(resolve_color(" Bright_Red "), "\x1b[91m");
        assert_eq!(resolve_color("ansi:\x1b[4m"), "\x1b[4m");
        assert_eq!(resolve_color("none"), "");
        assert_eq!(resolve_color("mauve"), "");
    }

    #[test]
    fn paint_respects_enabled() {
        let mut colors = ColorConfig::default();
        assert_eq!(colors.success("ok"), "ok");
        colors.enabled = true;
        assert_eq!(colors.success("ok"), "\x1b[32mok\x1b[0m");
        colors.failure = "none".to_string();
        assert_eq!(colors.failure("bad"), "bad");
    }

    #[test]
    fn settings() {
        let mut colors = ColorConfig::default();
        apply_color_setting(&mut colors, "heading", "cyan").unwrap();
        assert_eq!(colors.heading, "cyan");
        assert_eq!(
            apply_color_setting(&mut colors, "prompt", "red").unwrap_err(),
            "unknown color key 'prompt'"
        );
    }

    #[test]
    fn no_color_disables() {
        assert!(!colors_enabled(Some("1".to_string())));
    }
}
