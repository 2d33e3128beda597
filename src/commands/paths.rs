//! # Paths Command Implementation
//!
//! Prints the resolved theme roots, the template search paths handed to
//! multi-root engines, the directories a dev server should watch and the
//! static directories copied into the output.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use theme_overlay::host::PassthroughCopy;
use theme_overlay::path::to_posix;
use theme_overlay::plugin::{tier_stack, ThemePaths};

use super::GlobalArgs;

/// Arguments for the paths command
#[derive(Args, Debug)]
pub struct PathsArgs {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct PathsListing {
    theme: ThemePaths,
    search_paths: Vec<PathBuf>,
    watch_targets: Vec<PathBuf>,
    passthrough_copies: Vec<PassthroughCopy>,
}

/// Execute the paths command
pub fn execute(global: &GlobalArgs, args: PathsArgs) -> Result<()> {
    let config = global.load()?;
    let theme = ThemePaths::from_config(&config);
    let listing = PathsListing {
        search_paths: tier_stack(&config).search_paths(),
        watch_targets: theme.watch_targets(),
        passthrough_copies: if config.register_passthrough_copies {
            theme.passthrough_copies()
        } else {
            Vec::new()
        },
        theme,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    let theme = &listing.theme;
    println!("core_src:      {}", theme.core_src.display());
    println!("core_includes: {}", theme.core_includes.display());
    println!("core_layouts:  {}", theme.core_layouts.display());
    println!("core_data:     {}", theme.core_data.display());
    println!("core_assets:   {}", theme.core_assets.display());
    if let Some(overlay) = &theme.overlay_src {
        println!("overlay_src:   {}", overlay.display());
    }
    println!("site_src:      {}", theme.site_src.display());
    println!("out_dir:       {}", theme.out_dir.display());
    println!();
    println!("Search paths:");
    for (i, dir) in listing.search_paths.iter().enumerate() {
        println!("  {}. {}", i + 1, dir.display());
    }
    println!();
    println!("Watch targets:");
    for dir in &listing.watch_targets {
        println!("  {}", dir.display());
    }
    if !listing.passthrough_copies.is_empty() {
        println!();
        println!("Passthrough copies:");
        for copy in &listing.passthrough_copies {
            println!("  {} -> /{}", copy.source.display(), to_posix(&copy.output));
        }
    }
    Ok(())
}
