//! Default values for theme-overlay configuration.
//!
//! Kept in one place so the config schema, the CLI, and the tests agree.

use std::path::PathBuf;

/// Configuration file looked up in the site root.
pub const CONFIG_FILE: &str = ".theme-overlay.yaml";

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "THEME_OVERLAY_CONFIG";

pub fn site_input_dir() -> PathBuf {
    PathBuf::from("src")
}

pub fn output_dir() -> PathBuf {
    PathBuf::from("dist")
}

pub fn layouts_namespace() -> String {
    "core".to_string()
}

pub fn ignore() -> Vec<String> {
    vec!["**/.DS_Store".to_string()]
}

pub(crate) fn enabled() -> bool {
    true
}
