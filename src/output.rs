//! # Output Configuration
//!
//! This module provides utilities for controlling CLI output appearance,
//! including color and emoji support based on terminal capabilities and
//! user preferences.
//!
//! ## Respecting User Preferences
//!
//! The module respects the following environment variables and flags:
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! ## Usage
//!
//! ```rust,ignore
//! use theme_overlay::output::{OutputConfig, emoji};
//!
//! let config = OutputConfig::from_env_and_flag("auto");
//! println!("{} Syncing...", emoji(&config, "🔄", "[SYNC]"));
//! ```

use std::env;

use console::style;

use crate::sync::{FileOutcome, SyncReport};

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// `color_flag` is the value of `--color`: "always", "never", or "auto".
    /// In auto mode, colors are disabled if:
    /// - `NO_COLOR` environment variable is set (any value, including empty)
    /// - `CLICOLOR=0` is set
    /// - `TERM=dumb` is set
    /// - stdout is not a TTY (unless `CLICOLOR_FORCE=1`)
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
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

/// Returns the emoji when colors are enabled, otherwise the plain text.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// Render a sync report as a summary line followed by one line per
/// non-copy outcome.
pub fn render_report(config: &OutputConfig, report: &SyncReport) -> String {
    let icon = if !report.ran {
        emoji(config, "⏭️ ", "[SKIP]")
    } else if report.is_clean() {
        emoji(config, "✅", "[OK]")
    } else {
        emoji(config, "⚠️ ", "[WARN]")
    };
    let mut out = format!("{} {}", icon, report);

    for record in &report.records {
        let path = record.path.display();
        let line = match &record.outcome {
            FileOutcome::Copied => continue,
            FileOutcome::Deleted => format!("  - {}", path),
            FileOutcome::Skipped(reason) => format!("  ~ {} ({})", path, reason),
            FileOutcome::Failed(reason) => {
                let text = format!("  ! {}: {}", path, reason);
                if config.use_color {
                    style(text).red().to_string()
                } else {
                    text
                }
            }
        };
        out.push('\n');
        out.push_str(&line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{FileRecord, Strategy};

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
        assert_eq!(emoji(&config, "🔄", "[SYNC]"), "🔄");
    }

    #[test]
    fn test_emoji_helper_without_color() {
        let config = OutputConfig::without_color();
        assert_eq!(emoji(&config, "🔄", "[SYNC]"), "[SYNC]");
    }

    #[test]
    fn test_render_report_plain() {
        let mut report = SyncReport::new(Strategy::MergeOnce, "src/_includes");
        report.push(FileRecord::new("footer.njk", FileOutcome::Copied));
        report.push(FileRecord::new("old.njk", FileOutcome::Deleted));
        report.push(FileRecord::new(
            "locked.njk",
            FileOutcome::Failed("permission denied".to_string()),
        ));

        let text = render_report(&OutputConfig::without_color(), &report);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines[0],
            "[WARN] merge-once src/_includes: 1 copied, 1 deleted, 0 skipped, 1 failed"
        );
        assert_eq!(lines[1], "  - old.njk");
        assert_eq!(lines[2], "  ! locked.njk: permission denied");
    }

    #[test]
    fn test_render_up_to_date() {
        let report = SyncReport::up_to_date(Strategy::Mirror, "src/_layouts/core");
        let text = render_report(&OutputConfig::without_color(), &report);
        assert_eq!(text, "[SKIP] mirror src/_layouts/core: up to date");
    }
}
