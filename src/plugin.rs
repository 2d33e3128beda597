//! # Theme Setup
//!
//! [`setup`] wires a shared core into a templating host in one call:
//!
//! 1. **Search paths**: site includes and layouts before core ones (with the
//!    overlay tier in between when configured), for every engine that
//!    supports multi-root lookup.
//! 2. **Layout aliases**: every overlay or core layout the site does not
//!    override is aliased to its copy in the mirrored namespace.
//! 3. **Passthrough copies**: the core's static asset directories.
//! 4. **Before-build hook**: merge-once sync of includes, mirror sync of
//!    layouts, then the configured `before_build` pipeline steps. Both syncs
//!    read the overlay first and core second.
//! 5. **After-build hook**: the `after_build` steps, when enabled.
//!
//! The returned [`ThemePaths`] are the resolved roots, for templates and for
//! callers that need to know what to watch.

use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Serialize;

use crate::alias::{register_aliases, AliasTarget};
use crate::config::ThemeConfig;
use crate::error::Result;
use crate::filesystem::{FileTree, IgnoreSet};
use crate::host::{BuildContext, Engine, PassthroughCopy, TemplateHost};
use crate::pipeline::{command_steps, run_steps, PipelineEnv};
use crate::resolver::{TierStack, INCLUDES_DIR, LAYOUTS_DIR};
use crate::sync::{merge, mirror};

/// Asset directories below `core_assets` and where they land in the output.
const PASSTHROUGH_DIRS: [(&str, &str); 6] = [
    ("fonts", "assets/fonts"),
    ("images/template", "assets/images/template"),
    ("og-images", "assets/og-images"),
    ("svg", "assets/svg"),
    ("scripts", "assets/scripts"),
    ("images/favicon", ""),
];

/// Resolved directories of a configured theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThemePaths {
    pub core_src: PathBuf,
    pub core_includes: PathBuf,
    pub core_layouts: PathBuf,
    pub core_data: PathBuf,
    pub core_assets: PathBuf,
    pub overlay_src: Option<PathBuf>,
    pub site_src: PathBuf,
    pub out_dir: PathBuf,
}

impl ThemePaths {
    pub fn from_config(config: &ThemeConfig) -> Self {
        let core = &config.core_src;
        Self {
            core_src: core.clone(),
            core_includes: core.join(INCLUDES_DIR),
            core_layouts: core.join(LAYOUTS_DIR),
            core_data: core.join("_data"),
            core_assets: core.join("assets"),
            overlay_src: config.overlay_src.clone(),
            site_src: config.site_input_dir.clone(),
            out_dir: config.output_dir.clone(),
        }
    }

    pub fn site_includes(&self) -> PathBuf {
        self.site_src.join(INCLUDES_DIR)
    }

    pub fn site_layouts(&self) -> PathBuf {
        self.site_src.join(LAYOUTS_DIR)
    }

    /// Include sources in precedence order: the overlay, when configured and
    /// present, then core.
    pub fn include_layers(&self, ignore: &IgnoreSet) -> Vec<FileTree> {
        self.layers(INCLUDES_DIR, &self.core_includes, ignore)
    }

    /// Layout sources in precedence order, like
    /// [`include_layers`](Self::include_layers).
    pub fn layout_layers(&self, ignore: &IgnoreSet) -> Vec<FileTree> {
        self.layers(LAYOUTS_DIR, &self.core_layouts, ignore)
    }

    fn layers(&self, dir: &str, core: &Path, ignore: &IgnoreSet) -> Vec<FileTree> {
        let overlay = self
            .overlay_src
            .as_ref()
            .map(|root| FileTree::new(root.join(dir)).optional());
        overlay
            .into_iter()
            .chain(std::iter::once(FileTree::new(core)))
            .map(|tree| tree.with_ignore(ignore.clone()))
            .collect()
    }

    /// Static asset directories the host copies into the output verbatim.
    pub fn passthrough_copies(&self) -> Vec<PassthroughCopy> {
        PASSTHROUGH_DIRS
            .iter()
            .map(|(source, output)| PassthroughCopy {
                source: self.core_assets.join(source),
                output: PathBuf::from(output),
            })
            .collect()
    }

    /// Directories whose changes should trigger a rebuild.
    pub fn watch_targets(&self) -> Vec<PathBuf> {
        vec![
            self.site_src.join("assets"),
            self.site_includes(),
            self.core_assets.clone(),
            self.core_includes.clone(),
        ]
    }

    pub fn pipeline_env(&self) -> PipelineEnv {
        PipelineEnv {
            core_src: self.core_src.clone(),
            site_src: self.site_src.clone(),
            out_dir: self.out_dir.clone(),
        }
    }
}

/// The tier stack described by a configuration.
pub fn tier_stack(config: &ThemeConfig) -> TierStack {
    let stack = TierStack::new(&config.site_input_dir, &config.core_src);
    match &config.overlay_src {
        Some(overlay) => stack.with_overlay(overlay),
        None => stack,
    }
}

/// Register a theme with `host`.
///
/// Fails when the configuration is invalid, when the core layouts cannot be
/// enumerated, or when the host rejects search paths or a passthrough copy
/// for a reason other than an unsupported engine.
pub fn setup<H>(host: &mut H, config: &ThemeConfig) -> Result<ThemePaths>
where
    H: TemplateHost + ?Sized,
{
    config.validate()?;
    let paths = ThemePaths::from_config(config);
    let ignore = config.ignore_set()?;

    if config.configure_search_paths {
        let dirs = tier_stack(config).search_paths();
        for engine in Engine::multi_root() {
            match host.add_search_paths(&engine, &dirs) {
                Ok(()) => debug!("Configured {} search paths for {}", dirs.len(), engine),
                Err(e) if !e.is_fatal() => debug!("{}", e),
                Err(e) => return Err(e),
            }
        }
    }

    let includes = paths.include_layers(&ignore);
    let layouts = paths.layout_layers(&ignore);

    if config.auto_register_layout_aliases {
        register_aliases(
            &layouts,
            &paths.site_layouts(),
            AliasTarget::Mirrored(&config.layouts_namespace),
            host,
        )?;
    }

    if config.register_passthrough_copies {
        for copy in paths.passthrough_copies() {
            host.add_passthrough_copy(&copy.source, &copy.output)?;
        }
    }

    let site_includes = paths.site_includes();
    let site_layouts = paths.site_layouts();
    let namespace = config.layouts_namespace.clone();
    let env = paths.pipeline_env();
    let run_pipeline = config.enable_build_pipeline;
    let before_steps = command_steps(&config.before_build);

    host.on_before_build(Box::new(move |ctx: &mut BuildContext| {
        ctx.reports.push(merge::sync_layers(&includes, &site_includes)?);
        ctx.reports.push(mirror::sync_layers(
            &layouts,
            &site_layouts,
            &namespace,
            ctx.force,
        )?);
        if run_pipeline && !ctx.skip_pipeline {
            run_steps(&before_steps, &env, ctx)?;
        }
        Ok(())
    }));

    if config.enable_after_build && !config.after_build.is_empty() {
        let after_steps = command_steps(&config.after_build);
        let env = paths.pipeline_env();
        host.on_after_build(Box::new(move |ctx: &mut BuildContext| {
            if ctx.skip_pipeline {
                return Ok(());
            }
            run_steps(&after_steps, &env, ctx)
        }));
    }

    info!(
        "Theme core {} registered for site {}",
        paths.core_src.display(),
        paths.site_src.display()
    );
    Ok(paths)
}
