//! Tiered template resolution
//!
//! Sites sit on top of a shared core, optionally with an overlay tier in
//! between. For any [`LogicalKey`] the first tier holding a file under any
//! recognized extension is authoritative; extensions never decide between
//! tiers.
//!
//! All functions here only probe for existence. Nothing is written.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::path::LogicalKey;
use crate::search_paths::compose_layered_search_paths;

/// Directory name of the includes namespace inside a tier root.
pub const INCLUDES_DIR: &str = "_includes";
/// Directory name of the layouts namespace inside a tier root.
pub const LAYOUTS_DIR: &str = "_layouts";

/// Whether `tier_root` holds a file for `key` under any recognized extension.
///
/// A missing tier root simply has no overrides, and a directory named like a
/// template is not one.
pub fn has_override(tier_root: &Path, key: &LogicalKey) -> bool {
    key.candidates().any(|candidate| tier_root.join(candidate).is_file())
}

/// The ownership layer a tier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierKind {
    Site,
    Overlay,
    Core,
}

impl fmt::Display for TierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TierKind::Site => f.write_str("site"),
            TierKind::Overlay => f.write_str("overlay"),
            TierKind::Core => f.write_str("core"),
        }
    }
}

/// Which template namespace a key lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Include,
    Layout,
}

impl TemplateKind {
    /// Directory name of this namespace inside a tier root.
    pub fn dir_name(self) -> &'static str {
        match self {
            TemplateKind::Include => INCLUDES_DIR,
            TemplateKind::Layout => LAYOUTS_DIR,
        }
    }
}

/// One layer of source files.
#[derive(Debug, Clone)]
pub struct Tier {
    pub kind: TierKind,
    /// The tier's source root, holding `_includes` and `_layouts`.
    pub root: PathBuf,
}

impl Tier {
    /// Directory for a template namespace within this tier.
    pub fn dir(&self, kind: TemplateKind) -> PathBuf {
        self.root.join(kind.dir_name())
    }
}

/// The file that backs a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub tier: TierKind,
    pub path: PathBuf,
}

/// Tiers ordered from highest to lowest precedence.
#[derive(Debug, Clone)]
pub struct TierStack {
    tiers: Vec<Tier>,
}

impl TierStack {
    /// A two-tier stack: site over core.
    pub fn new<S: Into<PathBuf>, C: Into<PathBuf>>(site_root: S, core_root: C) -> Self {
        Self {
            tiers: vec![
                Tier {
                    kind: TierKind::Site,
                    root: site_root.into(),
                },
                Tier {
                    kind: TierKind::Core,
                    root: core_root.into(),
                },
            ],
        }
    }

    /// Insert an overlay tier between site and core.
    pub fn with_overlay<P: Into<PathBuf>>(mut self, overlay_root: P) -> Self {
        self.tiers.retain(|t| t.kind != TierKind::Overlay);
        let core_index = self
            .tiers
            .iter()
            .position(|t| t.kind == TierKind::Core)
            .unwrap_or(self.tiers.len());
        self.tiers.insert(
            core_index,
            Tier {
                kind: TierKind::Overlay,
                root: overlay_root.into(),
            },
        );
        self
    }

    /// Tiers in precedence order.
    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    /// Find the tier and file that back `key`.
    pub fn resolve(&self, kind: TemplateKind, key: &LogicalKey) -> Option<Resolved> {
        self.tiers.iter().find_map(|tier| {
            let dir = tier.dir(kind);
            key.candidates()
                .map(|candidate| dir.join(candidate))
                .find(|path| path.is_file())
                .map(|path| Resolved {
                    tier: tier.kind,
                    path,
                })
        })
    }

    /// Like [`resolve`](Self::resolve), but a missing key is an error.
    pub fn resolve_required(&self, kind: TemplateKind, key: &LogicalKey) -> Result<Resolved> {
        self.resolve(kind, key).ok_or_else(|| Error::TemplateNotFound {
            key: key.to_string(),
            searched: self
                .tiers
                .iter()
                .map(|t| t.kind.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
    }

    /// Ordered search paths covering every tier.
    pub fn search_paths(&self) -> Vec<PathBuf> {
        let roots: Vec<&Path> = self.tiers.iter().map(|t| t.root.as_path()).collect();
        compose_layered_search_paths(&roots)
    }
}
