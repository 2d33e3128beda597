//! Layout alias registration
//!
//! Hosts whose layout lookup only checks the site's own layouts directory
//! cannot find shared layouts on their own. For every layout the overlay or
//! core ships, this module registers `key -> target` with the host unless the
//! site already provides a layout under the same key.
//!
//! Where the target points is decided by [`AliasTarget`]: the source file in
//! place, or the copy kept up to date by [`sync::mirror`](crate::sync::mirror).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Serialize;

use crate::error::Result;
use crate::filesystem::FileTree;
use crate::host::TemplateHost;
use crate::path::LogicalKey;
use crate::resolver::has_override;

/// Keys handled by one registration pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AliasSummary {
    /// Keys the host accepted, in registration order.
    pub registered: Vec<LogicalKey>,
    /// Keys skipped because the site provides its own layout.
    pub overridden: Vec<LogicalKey>,
    /// Keys refused by the host or by the mirror layout, with the reason.
    pub rejected: Vec<RejectedAlias>,
}

/// A registration that was refused.
#[derive(Debug, Clone, Serialize)]
pub struct RejectedAlias {
    pub key: LogicalKey,
    pub reason: String,
}

/// Where a registered alias points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasTarget<'a> {
    /// The layout file inside the tree that supplies it.
    Direct,
    /// The mirrored copy, relative to the site layouts directory.
    Mirrored(&'a str),
}

impl AliasTarget<'_> {
    fn resolve(&self, layer: &FileTree, rel: &Path) -> PathBuf {
        match self {
            AliasTarget::Direct => layer.join(rel),
            AliasTarget::Mirrored(namespace) => Path::new(namespace).join(rel),
        }
    }

    /// A key under the namespace would alias a file inside the mirror, and
    /// the mirror itself would pass for a site override.
    fn collides(&self, key: &LogicalKey) -> bool {
        match self {
            AliasTarget::Direct => false,
            AliasTarget::Mirrored(namespace) => key
                .as_str()
                .strip_prefix(namespace)
                .is_some_and(|rest| rest.starts_with('/')),
        }
    }
}

/// Register aliases for every shared layout the site does not override.
///
/// `layers` are visited in precedence order (overlay before core); a key
/// supplied by an earlier layer is not registered again from a later one.
/// Within a layer, layouts are visited in sorted relative-path order, so when
/// two files share a key (`post.njk` and `post.md`) the first one wins and the
/// second is rejected by the host. Rejections are logged and never stop the
/// pass. Fails only when a required layouts tree cannot be enumerated.
pub fn register_aliases<H>(
    layers: &[FileTree],
    site_layouts_root: &Path,
    target: AliasTarget<'_>,
    host: &mut H,
) -> Result<AliasSummary>
where
    H: TemplateHost + ?Sized,
{
    let mut summary = AliasSummary::default();
    let mut claimed: HashSet<LogicalKey> = HashSet::new();

    for layer in layers {
        let mut supplied = Vec::new();
        for rel in layer.list_templates()? {
            let Some(key) = LogicalKey::from_relative(&rel) else {
                debug!("Skipping {}: no usable layout key", rel.display());
                continue;
            };

            if claimed.contains(&key) {
                debug!(
                    "Layout '{}' from {} is shadowed by a higher layer",
                    key,
                    layer.root().display()
                );
                continue;
            }
            supplied.push(key.clone());

            if target.collides(&key) {
                warn!(
                    "Skipping layout alias '{}': collides with the mirror namespace",
                    key
                );
                summary.rejected.push(RejectedAlias {
                    key,
                    reason: "collides with the mirror namespace".to_string(),
                });
                continue;
            }

            if has_override(site_layouts_root, &key) {
                debug!("Layout '{}' is overridden by the site", key);
                summary.overridden.push(key);
                continue;
            }

            let path = target.resolve(layer, &rel);
            match host.add_layout_alias(&key, &path) {
                Ok(()) => {
                    debug!("Aliased layout '{}' -> {}", key, path.display());
                    summary.registered.push(key);
                }
                Err(e) => {
                    warn!("Skipping layout alias '{}': {}", key, e);
                    summary.rejected.push(RejectedAlias {
                        key,
                        reason: e.to_string(),
                    });
                }
            }
        }
        claimed.extend(supplied);
    }

    info!(
        "Registered {} layout aliases ({} overridden by site, {} rejected)",
        summary.registered.len(),
        summary.overridden.len(),
        summary.rejected.len()
    );
    Ok(summary)
}
