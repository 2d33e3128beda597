//! # Clean Command Implementation
//!
//! Removes what synchronization put into the site: the tracked include copies
//! with their manifest, and the mirrored layouts namespace with its marker.
//! Site-authored files are never touched.

use anyhow::Result;
use clap::Args;
use theme_overlay::output::render_report;
use theme_overlay::plugin::ThemePaths;
use theme_overlay::sync::{merge, mirror};

use super::GlobalArgs;

/// Arguments for the clean command
#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Remove tracked include copies and the manifest
    #[arg(long)]
    pub includes: bool,

    /// Remove the mirrored layouts namespace
    #[arg(long)]
    pub layouts: bool,
}

/// Execute the clean command
///
/// With neither flag both namespaces are cleaned.
pub fn execute(global: &GlobalArgs, args: CleanArgs) -> Result<()> {
    let config = global.load()?;
    let paths = ThemePaths::from_config(&config);
    let both = !args.includes && !args.layouts;

    let mut reports = Vec::new();
    if args.includes || both {
        reports.push(merge::clean(&paths.site_includes()));
    }
    if args.layouts || both {
        reports.push(mirror::clean(
            &paths.site_layouts(),
            &config.layouts_namespace,
        )?);
    }

    for report in &reports {
        println!("{}", render_report(&global.output, report));
    }
    Ok(())
}
