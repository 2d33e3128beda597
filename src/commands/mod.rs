//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `theme-overlay` command-line tool. Each subcommand is defined in its own
//! file to keep the logic separated and maintainable.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the global options and the parsed
//!   `Args` and performs the command's logic.
//!
//! Commands that need a configuration load it through [`GlobalArgs::load`],
//! which applies the `--config` / `--site-root` lookup rules.

pub mod aliases;
pub mod clean;
pub mod completions;
pub mod paths;
pub mod resolve;
pub mod status;
pub mod sync;

use std::path::PathBuf;

use anyhow::{Context, Result};
use theme_overlay::config::{self, ThemeConfig};
use theme_overlay::defaults::CONFIG_FILE;
use theme_overlay::output::OutputConfig;
use theme_overlay::suggestions;

/// Options shared by every command.
#[derive(Debug)]
pub struct GlobalArgs {
    pub output: OutputConfig,
    pub config: Option<PathBuf>,
    pub site_root: Option<PathBuf>,
}

impl GlobalArgs {
    /// Path of the configuration file to load.
    pub fn config_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.config {
            return Ok(path.clone());
        }
        let root = match &self.site_root {
            Some(root) => root.clone(),
            None => std::env::current_dir().context("Failed to get current directory")?,
        };
        Ok(root.join(CONFIG_FILE))
    }

    /// Load and validate the configuration.
    pub fn load(&self) -> Result<ThemeConfig> {
        let path = self.config_path()?;
        if !path.exists() {
            return Err(suggestions::config_not_found(&path));
        }
        let config = config::from_file(&path)
            .with_context(|| format!("Failed to load {}", path.display()))?;
        if !config.core_src.is_dir() {
            return Err(suggestions::core_missing(&config.core_src));
        }
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}
