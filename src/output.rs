//! # Output Configuration
//!
//! Controls the appearance of user-facing CLI output (colors and emojis)
//! based on terminal capabilities and user preferences.
//!
//! The module respects:
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - disables colors
//! - `CLICOLOR_FORCE=1` - forces colors even in non-TTY
//! - `TERM=dumb` - disables colors for dumb terminals

use std::env;

use console::style;

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// `--color=always` forces colors on (overriding `NO_COLOR`),
    /// `--color=never` forces them off, and `auto` detects from the
    /// environment and terminal.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // The presence of NO_COLOR (even empty) disables colors.
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    /// Style `text` as a success message when colors are enabled.
    pub fn success(&self, text: &str) -> String {
        if self.use_color {
            style(text).green().bold().to_string()
        } else {
            text.to_string()
        }
    }

    /// Style `text` as a failure message when colors are enabled.
    pub fn failure(&self, text: &str) -> String {
        if self.use_color {
            style(text).red().bold().to_string()
        } else {
            text.to_string()
        }
    }

    /// Style `text` as dimmed detail when colors are enabled.
    pub fn dim(&self, text: &str) -> String {
        if self.use_color {
            style(text).dim().to_string()
        } else {
            text.to_string()
        }
    }

    /// Create a configuration with colors always enabled.
    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    /// Create a configuration with colors always disabled.
    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns the emoji when colors are enabled, the plain alternative when not.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_always() {
        let config = OutputConfig::from_env_and_flag("always");
        assert!(config.use_color);
    }

    #[test]
    fn test_color_never() {
        let config = OutputConfig::from_env_and_flag("never");
        assert!(!config.use_color);
    }

    #[test]
    fn test_emoji_helper_with_color() {
        let config = OutputConfig::with_color();
        assert_eq!(emoji(&config, "🎉", "[OK]"), "🎉");
    }

    #[test]
    fn test_emoji_helper_without_color() {
        let config = OutputConfig::without_color();
        assert_eq!(emoji(&config, "🎉", "[OK]"), "[OK]");
    }

    #[test]
    fn test_styles_are_plain_without_color() {
        let config = OutputConfig::without_color();
        assert_eq!(config.success("done"), "done");
        assert_eq!(config.failure("broken"), "broken");
        assert_eq!(config.dim("detail"), "detail");
    }
}
