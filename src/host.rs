//! # Templating Host Interface
//!
//! The engine never renders anything itself. It talks to the templating host
//! through the [`TemplateHost`] trait:
//!
//! - **Search paths**: ordered directories for engines with multi-root
//!   lookup. An engine without that support answers
//!   [`Error::UnsupportedEngine`], which callers log and ignore.
//! - **Layout aliases**: `key -> target` mappings for hosts whose layout
//!   resolver only checks a single root. Duplicate keys are rejected with
//!   [`Error::AliasConflict`].
//! - **Passthrough copies**: static asset directories the host copies
//!   verbatim into its output.
//! - **Lifecycle hooks**: callbacks run before and after each build.
//!
//! [`RecordingHost`] is an in-process implementation that keeps everything it
//! is given. The CLI drives builds through it and tests inspect it.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::path::LogicalKey;
use crate::sync::SyncReport;

/// A template language registered with the host.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Engine {
    Nunjucks,
    Liquid,
    Other(String),
}

impl Engine {
    /// Engines that take search paths by default.
    pub fn multi_root() -> [Engine; 2] {
        [Engine::Nunjucks, Engine::Liquid]
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::Nunjucks => f.write_str("nunjucks"),
            Engine::Liquid => f.write_str("liquid"),
            Engine::Other(name) => f.write_str(name),
        }
    }
}

/// State shared by the hooks of a single build.
#[derive(Debug, Default)]
pub struct BuildContext {
    /// Bypass change detection for mirrored namespaces.
    pub force: bool,
    /// Skip external pipeline steps for this build.
    pub skip_pipeline: bool,
    /// Reports from every synchronization pass run by a hook.
    pub reports: Vec<SyncReport>,
    /// Names of external pipeline steps that ran.
    pub steps: Vec<String>,
}

impl BuildContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_skip_pipeline(mut self, skip: bool) -> Self {
        self.skip_pipeline = skip;
        self
    }

    /// Total failed file operations across all reports.
    pub fn failure_count(&self) -> usize {
        self.reports.iter().map(|r| r.failures().count()).sum()
    }
}

/// A callback invoked around each build.
pub type BuildHook = Box<dyn FnMut(&mut BuildContext) -> Result<()> + Send>;

/// Operations the engine consumes from a templating host.
pub trait TemplateHost {
    /// Register ordered include directories for one engine.
    fn add_search_paths(&mut self, engine: &Engine, dirs: &[PathBuf]) -> Result<()>;

    /// Register `key` so that `layout: <key>` loads `target`.
    fn add_layout_alias(&mut self, key: &LogicalKey, target: &Path) -> Result<()>;

    /// Copy `source` verbatim to `output` below the build output directory.
    /// An empty `output` means the output root.
    fn add_passthrough_copy(&mut self, source: &Path, output: &Path) -> Result<()>;

    /// Run `hook` before every build.
    fn on_before_build(&mut self, hook: BuildHook);

    /// Run `hook` after every build.
    fn on_after_build(&mut self, hook: BuildHook);
}

/// One registered layout alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AliasEntry {
    pub key: LogicalKey,
    pub target: PathBuf,
}

/// A static directory copied verbatim into the build output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassthroughCopy {
    pub source: PathBuf,
    /// Destination relative to the output directory.
    pub output: PathBuf,
}

/// Layout aliases in registration order; keys are unique.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct AliasMap {
    entries: Vec<AliasEntry>,
}

impl AliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an alias, rejecting keys that are already present.
    pub fn insert(&mut self, key: LogicalKey, target: PathBuf) -> Result<()> {
        if let Some(existing) = self.get(&key) {
            return Err(Error::AliasConflict {
                key: key.to_string(),
                existing: existing.to_path_buf(),
            });
        }
        self.entries.push(AliasEntry { key, target });
        Ok(())
    }

    pub fn get(&self, key: &LogicalKey) -> Option<&Path> {
        self.entries
            .iter()
            .find(|e| &e.key == key)
            .map(|e| e.target.as_path())
    }

    pub fn contains(&self, key: &LogicalKey) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &LogicalKey> {
        self.entries.iter().map(|e| &e.key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AliasEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ordered before/after build hooks.
#[derive(Default)]
pub struct Lifecycle {
    before: Vec<BuildHook>,
    after: Vec<BuildHook>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_before(&mut self, hook: BuildHook) {
        self.before.push(hook);
    }

    pub fn push_after(&mut self, hook: BuildHook) {
        self.after.push(hook);
    }

    /// Run before-build hooks in registration order.
    ///
    /// Stops at the first hook that returns an error.
    pub fn run_before(&mut self, ctx: &mut BuildContext) -> Result<()> {
        for hook in self.before.iter_mut() {
            hook(ctx)?;
        }
        Ok(())
    }

    /// Run after-build hooks in registration order.
    pub fn run_after(&mut self, ctx: &mut BuildContext) -> Result<()> {
        for hook in self.after.iter_mut() {
            hook(ctx)?;
        }
        Ok(())
    }

    pub fn before_len(&self) -> usize {
        self.before.len()
    }

    pub fn after_len(&self) -> usize {
        self.after.len()
    }
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("before", &self.before.len())
            .field("after", &self.after.len())
            .finish()
    }
}

/// A host that records everything registered with it.
#[derive(Debug)]
pub struct RecordingHost {
    supported: Vec<Engine>,
    search_paths: BTreeMap<Engine, Vec<PathBuf>>,
    aliases: AliasMap,
    passthrough: Vec<PassthroughCopy>,
    lifecycle: Lifecycle,
}

impl RecordingHost {
    /// A host whose Nunjucks and Liquid engines accept search paths.
    pub fn new() -> Self {
        Self::with_engines(Engine::multi_root())
    }

    /// A host where only `engines` accept search paths.
    pub fn with_engines<I: IntoIterator<Item = Engine>>(engines: I) -> Self {
        Self {
            supported: engines.into_iter().collect(),
            search_paths: BTreeMap::new(),
            aliases: AliasMap::new(),
            passthrough: Vec::new(),
            lifecycle: Lifecycle::new(),
        }
    }

    pub fn aliases(&self) -> &AliasMap {
        &self.aliases
    }

    pub fn passthrough_copies(&self) -> &[PassthroughCopy] {
        &self.passthrough
    }

    pub fn search_paths(&self, engine: &Engine) -> Option<&[PathBuf]> {
        self.search_paths.get(engine).map(Vec::as_slice)
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Run the before-build hooks of one build.
    pub fn run_before_build(&mut self) -> Result<BuildContext> {
        self.run_before_build_with(BuildContext::new())
    }

    /// Run the before-build hooks with caller-supplied build flags.
    pub fn run_before_build_with(&mut self, mut ctx: BuildContext) -> Result<BuildContext> {
        self.lifecycle.run_before(&mut ctx)?;
        Ok(ctx)
    }

    /// Run the after-build hooks, continuing the given build context.
    pub fn run_after_build(&mut self, ctx: &mut BuildContext) -> Result<()> {
        self.lifecycle.run_after(ctx)
    }
}

impl Default for RecordingHost {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateHost for RecordingHost {
    fn add_search_paths(&mut self, engine: &Engine, dirs: &[PathBuf]) -> Result<()> {
        if !self.supported.contains(engine) {
            return Err(Error::UnsupportedEngine {
                engine: engine.to_string(),
            });
        }
        self.search_paths.insert(engine.clone(), dirs.to_vec());
        Ok(())
    }

    fn add_layout_alias(&mut self, key: &LogicalKey, target: &Path) -> Result<()> {
        self.aliases.insert(key.clone(), target.to_path_buf())
    }

    fn add_passthrough_copy(&mut self, source: &Path, output: &Path) -> Result<()> {
        self.passthrough.push(PassthroughCopy {
            source: source.to_path_buf(),
            output: output.to_path_buf(),
        });
        Ok(())
    }

    fn on_before_build(&mut self, hook: BuildHook) {
        self.lifecycle.push_before(hook);
    }

    fn on_after_build(&mut self, hook: BuildHook) {
        self.lifecycle.push_after(hook);
    }
}
