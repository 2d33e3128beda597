//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use theme_overlay::output::OutputConfig;

use crate::commands;

/// Theme Overlay - Share template layouts and partials across sites
#[derive(Parser, Debug)]
#[command(name = "theme-overlay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,

    /// Path to the configuration file
    #[arg(short, long, global = true, value_name = "PATH", env = "THEME_OVERLAY_CONFIG")]
    config: Option<PathBuf>,

    /// Site root holding the configuration file (defaults to current directory)
    #[arg(long, global = true, value_name = "DIR")]
    site_root: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the before-build synchronization and pipeline
    Sync(commands::sync::SyncArgs),

    /// Show what the next sync would do
    Status(commands::status::StatusArgs),

    /// List the layout aliases that would be registered
    Aliases(commands::aliases::AliasesArgs),

    /// Show resolved theme paths and template search paths
    Paths(commands::paths::PathsArgs),

    /// Show which tier supplies a template
    Resolve(commands::resolve::ResolveArgs),

    /// Remove synchronized copies from the site
    Clean(commands::clean::CleanArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);
        let global = commands::GlobalArgs {
            output: OutputConfig::from_env_and_flag(&self.color),
            config: self.config,
            site_root: self.site_root,
        };

        match self.command {
            Commands::Sync(args) => commands::sync::execute(&global, args),
            Commands::Status(args) => commands::status::execute(&global, args),
            Commands::Aliases(args) => commands::aliases::execute(&global, args),
            Commands::Paths(args) => commands::paths::execute(&global, args),
            Commands::Resolve(args) => commands::resolve::execute(&global, args),
            Commands::Clean(args) => commands::clean::execute(&global, args),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// Install the logger; `RUST_LOG` wins over `--log-level` when set.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}
