//! # Status Command Implementation
//!
//! Shows what the next `sync` would do without touching the site: which shared
//! includes would be copied or removed, which copies are tracked, and whether
//! the layouts mirror is out of date.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use theme_overlay::output::emoji;
use theme_overlay::path::to_posix;
use theme_overlay::plugin::ThemePaths;
use theme_overlay::sync::merge::{self, MergePlan};
use theme_overlay::sync::{mirror, Manifest};

use super::GlobalArgs;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct IncludesStatus {
    target: PathBuf,
    tracked: Vec<String>,
    plan: MergePlan,
}

#[derive(Serialize)]
struct LayoutsStatus {
    target: PathBuf,
    due: bool,
}

#[derive(Serialize)]
struct Status {
    includes: IncludesStatus,
    layouts: LayoutsStatus,
}

/// Execute the status command
pub fn execute(global: &GlobalArgs, args: StatusArgs) -> Result<()> {
    let config = global.load()?;
    let ignore = config.ignore_set()?;

    let paths = ThemePaths::from_config(&config);

    let site_includes = paths.site_includes();
    let plan = merge::plan_layers(&paths.include_layers(&ignore), &site_includes)?;
    let tracked = Manifest::load(&merge::manifest_path(&site_includes));

    let site_layouts = paths.site_layouts();
    let due = mirror::is_due(
        &paths.layout_layers(&ignore),
        &site_layouts,
        &config.layouts_namespace,
    )?;

    let status = Status {
        includes: IncludesStatus {
            target: site_includes,
            tracked: tracked.files().into_iter().map(String::from).collect(),
            plan,
        },
        layouts: LayoutsStatus {
            target: mirror::target_dir(&site_layouts, &config.layouts_namespace)?,
            due,
        },
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let out = &global.output;
    println!(
        "{} Includes: {}",
        emoji(out, "📂", "[INCLUDES]"),
        status.includes.target.display()
    );
    println!("  tracked copies: {}", status.includes.tracked.len());
    let plan = &status.includes.plan;
    if plan.is_noop() && plan.adopted.is_empty() {
        println!("  up to date");
    }
    for rel in &plan.to_copy {
        println!("  + {}", to_posix(rel));
    }
    for rel in &plan.stale {
        println!("  - {}", to_posix(rel));
    }
    for rel in &plan.adopted {
        println!("  ~ {} (edited in site, will stop being tracked)", to_posix(rel));
    }

    println!(
        "{} Layouts: {}",
        emoji(out, "📐", "[LAYOUTS]"),
        status.layouts.target.display()
    );
    if status.layouts.due {
        println!("  out of date: layouts changed since the last mirror");
    } else {
        println!("  up to date");
    }
    Ok(())
}
