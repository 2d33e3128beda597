//! # Aliases Command Implementation
//!
//! Lists the layout aliases `setup` registers for the current site, along
//! with the shared layouts the site overrides.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use theme_overlay::alias::{register_aliases, AliasSummary, AliasTarget};
use theme_overlay::host::{AliasMap, RecordingHost};
use theme_overlay::output::emoji;
use theme_overlay::plugin::ThemePaths;

use super::GlobalArgs;

/// Arguments for the aliases command
#[derive(Args, Debug)]
pub struct AliasesArgs {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct AliasListing<'a> {
    aliases: &'a AliasMap,
    summary: &'a AliasSummary,
}

/// Execute the aliases command
pub fn execute(global: &GlobalArgs, args: AliasesArgs) -> Result<()> {
    let config = global.load()?;
    let paths = ThemePaths::from_config(&config);
    let layers = paths.layout_layers(&config.ignore_set()?);

    let mut host = RecordingHost::new();
    let summary = register_aliases(
        &layers,
        &paths.site_layouts(),
        AliasTarget::Mirrored(&config.layouts_namespace),
        &mut host,
    )?;

    if args.json {
        let listing = AliasListing {
            aliases: host.aliases(),
            summary: &summary,
        };
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    let out = &global.output;
    if host.aliases().is_empty() {
        println!("No layout aliases: the site overrides every shared layout.");
    }
    for entry in host.aliases().iter() {
        println!("{} -> {}", entry.key, entry.target.display());
    }
    for key in &summary.overridden {
        println!("{} {} (site override)", emoji(out, "🏠", "[SITE]"), key);
    }
    for rejected in &summary.rejected {
        println!(
            "{} {}: {}",
            emoji(out, "⚠️ ", "[SKIP]"),
            rejected.key,
            rejected.reason
        );
    }
    Ok(())
}
