//! # Configuration Schema and Parsing
//!
//! This module defines the `.theme-overlay.yaml` file read by the CLI and by
//! [`plugin::setup`](crate::plugin::setup). Every field except `core_src` has a
//! default, so the smallest valid file is a single line:
//!
//! ```yaml
//! core_src: ../theme-core/src
//! ```
//!
//! A fuller example:
//!
//! ```yaml
//! core_src: node_modules/theme-core/src
//! site_input_dir: src
//! output_dir: dist
//! overlay_src: overlay
//! layouts_namespace: core
//! ignore: ["**/.DS_Store", "**/*.swp"]
//! before_build:
//!   - name: css
//!     command: npx
//!     args: [postcss, src/assets/css/main.css, -o, dist/assets/main.css]
//! ```
//!
//! ## Parsing
//!
//! [`parse`] turns YAML text into a validated [`ThemeConfig`] whose paths are
//! still as written. [`from_file`] additionally resolves relative paths
//! against the directory holding the file, so a configuration behaves the
//! same no matter where the command is run from.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};
use crate::filesystem::IgnoreSet;
use crate::sync::mirror::validate_namespace;

/// An external program run as a build pipeline step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineCommand {
    /// Label used in logs and error messages.
    pub name: String,
    /// Program to execute, looked up on `PATH` when not a path.
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Working directory; defaults to the configuration directory.
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

/// The complete `.theme-overlay.yaml` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThemeConfig {
    /// Source root of the shared core, holding `_includes` and `_layouts`.
    #[serde(default)]
    pub core_src: PathBuf,

    /// Source root of the site.
    #[serde(default = "defaults::site_input_dir")]
    pub site_input_dir: PathBuf,

    /// Build output directory, handed to pipeline steps.
    #[serde(default = "defaults::output_dir")]
    pub output_dir: PathBuf,

    /// Optional tier between site and core.
    #[serde(default)]
    pub overlay_src: Option<PathBuf>,

    /// Directory under the site layouts that receives the core mirror.
    #[serde(default = "defaults::layouts_namespace")]
    pub layouts_namespace: String,

    #[serde(default = "defaults::enabled")]
    pub configure_search_paths: bool,

    #[serde(default = "defaults::enabled")]
    pub auto_register_layout_aliases: bool,

    #[serde(default = "defaults::enabled")]
    pub enable_build_pipeline: bool,

    #[serde(default = "defaults::enabled")]
    pub enable_after_build: bool,

    /// Hand the core's static asset directories to the host for verbatim
    /// copying into the output.
    #[serde(default = "defaults::enabled")]
    pub register_passthrough_copies: bool,

    /// Glob patterns excluded from core enumeration.
    #[serde(default = "defaults::ignore")]
    pub ignore: Vec<String>,

    #[serde(default)]
    pub before_build: Vec<PipelineCommand>,

    #[serde(default)]
    pub after_build: Vec<PipelineCommand>,
}

impl ThemeConfig {
    /// A configuration with every default and the given core root.
    pub fn new<P: Into<PathBuf>>(core_src: P) -> Self {
        Self {
            core_src: core_src.into(),
            site_input_dir: defaults::site_input_dir(),
            output_dir: defaults::output_dir(),
            overlay_src: None,
            layouts_namespace: defaults::layouts_namespace(),
            configure_search_paths: true,
            auto_register_layout_aliases: true,
            enable_build_pipeline: true,
            enable_after_build: true,
            register_passthrough_copies: true,
            ignore: defaults::ignore(),
            before_build: Vec::new(),
            after_build: Vec::new(),
        }
    }

    /// Check field values that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.core_src.as_os_str().is_empty() {
            return Err(Error::Config {
                message: "core_src is required".to_string(),
                hint: Some(
                    "Point core_src at the shared theme's source directory, e.g. `core_src: node_modules/theme-core/src`"
                        .to_string(),
                ),
            });
        }

        if validate_namespace(&self.layouts_namespace).is_err() {
            return Err(Error::Config {
                message: format!(
                    "layouts_namespace '{}' must be a single directory name",
                    self.layouts_namespace
                ),
                hint: Some("Use a plain name such as `core`".to_string()),
            });
        }

        if let Err(e) = IgnoreSet::new(&self.ignore) {
            return Err(Error::Config {
                message: format!("invalid ignore pattern: {}", e),
                hint: Some("Patterns use glob syntax, e.g. `**/.DS_Store`".to_string()),
            });
        }

        for step in self.before_build.iter().chain(&self.after_build) {
            if step.name.trim().is_empty() || step.command.trim().is_empty() {
                return Err(Error::Config {
                    message: "pipeline steps need both a name and a command".to_string(),
                    hint: None,
                });
            }
        }

        Ok(())
    }

    /// Make every relative path absolute against `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let absolutize = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        absolutize(&mut self.core_src);
        absolutize(&mut self.site_input_dir);
        absolutize(&mut self.output_dir);
        if let Some(overlay) = self.overlay_src.as_mut() {
            absolutize(overlay);
        }
        for step in self.before_build.iter_mut().chain(self.after_build.iter_mut()) {
            match step.cwd.as_mut() {
                Some(cwd) => absolutize(cwd),
                None => step.cwd = Some(base.to_path_buf()),
            }
        }
    }

    /// Compiled ignore patterns.
    pub fn ignore_set(&self) -> Result<IgnoreSet> {
        IgnoreSet::new(&self.ignore)
    }
}

/// Parse and validate configuration text.
pub fn parse(yaml_content: &str) -> Result<ThemeConfig> {
    if yaml_content.trim().is_empty() {
        return Err(Error::Config {
            message: "configuration is empty".to_string(),
            hint: Some("At minimum set `core_src`".to_string()),
        });
    }
    let config: ThemeConfig = serde_yaml::from_str(yaml_content)?;
    config.validate()?;
    Ok(config)
}

/// Load a configuration file and resolve its paths against its directory.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<ThemeConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    let mut config = parse(&content)?;
    let base = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    config.resolve_paths(&base);
    Ok(config)
}
