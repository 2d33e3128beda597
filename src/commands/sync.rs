//! # Sync Command Implementation
//!
//! Runs what a build host would run before each build: merge-once sync of
//! core includes, mirror sync of core layouts, then the configured
//! `before_build` pipeline steps.
//!
//! File operation failures do not fail the command unless `--strict` is
//! given; a core tree that cannot be enumerated always does.

use anyhow::Result;
use clap::Args;
use theme_overlay::host::{BuildContext, RecordingHost};
use theme_overlay::output::{emoji, render_report};
use theme_overlay::plugin;
use theme_overlay::suggestions;

use super::GlobalArgs;

/// Arguments for the sync command
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Mirror layouts even when core has not changed
    #[arg(short, long)]
    pub force: bool,

    /// Skip external pipeline steps
    #[arg(long)]
    pub no_pipeline: bool,

    /// Also run the after-build pipeline steps
    #[arg(long)]
    pub after_build: bool,

    /// Exit with an error when any file operation failed
    #[arg(long)]
    pub strict: bool,

    /// Print the reports as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the sync command
pub fn execute(global: &GlobalArgs, args: SyncArgs) -> Result<()> {
    let config = global.load()?;
    let mut host = RecordingHost::new();
    plugin::setup(&mut host, &config)?;

    let ctx = BuildContext::new()
        .with_force(args.force)
        .with_skip_pipeline(args.no_pipeline);
    let mut ctx = host.run_before_build_with(ctx)?;
    if args.after_build {
        host.run_after_build(&mut ctx)?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&ctx.reports)?);
    } else {
        for report in &ctx.reports {
            println!("{}", render_report(&global.output, report));
        }
        for step in &ctx.steps {
            println!("{} pipeline step '{}'", emoji(&global.output, "🔧", "[RUN]"), step);
        }
    }

    let failures = ctx.failure_count();
    if args.strict && failures > 0 {
        return Err(suggestions::sync_failures(failures));
    }
    Ok(())
}
