//! Mirror synchronization
//!
//! The whole layouts tree (an overlay stacked over core, or core alone) is
//! copied into `<site_layouts>/<namespace>`, replacing whatever a previous
//! pass left there. The namespace is owned entirely by
//! this module; site files never live inside it.
//!
//! Passes are gated by [`due_for_sync`]: when no source tree has changed
//! since the marker was written, nothing is touched. The marker is written
//! only after a pass in which every copy succeeded, so a partial mirror is
//! retried on the next build.

use std::path::{Component, Path, PathBuf};

use log::{debug, info, warn};
use rayon::prelude::*;

use super::{FileOutcome, FileRecord, Strategy, SyncReport};
use crate::cache::{due_for_sync, SyncMarker, MARKER_FILE};
use crate::error::{Error, Result};
use crate::filesystem::{copy_file, layered_files, remove_dir_all_if_exists, FileTree};
use crate::path::to_posix;

/// Check that a namespace names exactly one directory below the layouts root.
pub fn validate_namespace(namespace: &str) -> Result<()> {
    let mut components = Path::new(namespace).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !namespace.contains(['/', '\\']) => Ok(()),
        _ => Err(Error::Path {
            message: format!(
                "Invalid layouts namespace '{}': expected a single directory name",
                namespace
            ),
        }),
    }
}

/// The mirrored directory for `namespace`.
pub fn target_dir(site_layouts_root: &Path, namespace: &str) -> Result<PathBuf> {
    validate_namespace(namespace)?;
    Ok(site_layouts_root.join(namespace))
}

/// Location of the sync marker inside a mirrored directory.
pub fn marker_path(target: &Path) -> PathBuf {
    target.join(MARKER_FILE)
}

/// Whether a mirror pass of `layers` into `namespace` would run.
pub fn is_due(layers: &[FileTree], site_layouts_root: &Path, namespace: &str) -> Result<bool> {
    let target = target_dir(site_layouts_root, namespace)?;
    due_for_sync(layers, &marker_path(&target))
}

/// Mirror `core` into `<site_layouts_root>/<namespace>`.
///
/// With `force` the change check is skipped. Fails when the namespace is
/// invalid, overlaps the core tree, or the core tree cannot be enumerated.
pub fn sync(
    core: &FileTree,
    site_layouts_root: &Path,
    namespace: &str,
    force: bool,
) -> Result<SyncReport> {
    sync_layers(std::slice::from_ref(core), site_layouts_root, namespace, force)
}

/// Mirror the union of stacked `layers` (highest precedence first) into
/// `<site_layouts_root>/<namespace>`.
///
/// A path present in several layers is taken from the first. A change in any
/// layer, including an overlay that appears or disappears, makes the mirror
/// due.
pub fn sync_layers(
    layers: &[FileTree],
    site_layouts_root: &Path,
    namespace: &str,
    force: bool,
) -> Result<SyncReport> {
    let target = target_dir(site_layouts_root, namespace)?;
    for layer in layers {
        ensure_disjoint(layer.root(), &target)?;
    }
    let marker = marker_path(&target);

    if !force && !due_for_sync(layers, &marker)? {
        debug!("Mirror {} is up to date", target.display());
        return Ok(SyncReport::up_to_date(Strategy::Mirror, target));
    }

    let files: Vec<_> = layered_files(layers)?
        .into_iter()
        .filter(|f| f.relative.as_path() != Path::new(MARKER_FILE))
        .collect();

    let mut report = SyncReport::new(Strategy::Mirror, &target);
    if let Err(e) = remove_dir_all_if_exists(&target) {
        warn!("{}", e);
        report.push(FileRecord::new(".", FileOutcome::Failed(e.to_string())));
    }

    let copies: Vec<FileRecord> = files
        .par_iter()
        .map(|file| {
            let rel = &file.relative;
            match copy_file(&file.source, &target.join(rel)) {
                Ok(_) => {
                    debug!("Mirrored {}", to_posix(rel));
                    FileRecord::new(rel, FileOutcome::Copied)
                }
                Err(e) => {
                    warn!("Failed to mirror {}: {}", to_posix(rel), e);
                    FileRecord::new(rel, FileOutcome::Failed(e.to_string()))
                }
            }
        })
        .collect();
    report.records.extend(copies);

    if report.is_clean() {
        if let Err(e) = SyncMarker::now().save(&marker) {
            warn!("{}", e);
            report.push(FileRecord::new(
                MARKER_FILE,
                FileOutcome::Failed(e.to_string()),
            ));
        }
    } else {
        warn!(
            "Mirror {} incomplete; it will be retried on the next build",
            target.display()
        );
    }

    info!("{}", report);
    Ok(report)
}

/// Remove the mirrored namespace, marker included.
pub fn clean(site_layouts_root: &Path, namespace: &str) -> Result<SyncReport> {
    let target = target_dir(site_layouts_root, namespace)?;
    let mut report = SyncReport::new(Strategy::Mirror, &target);
    if target.exists() {
        match remove_dir_all_if_exists(&target) {
            Ok(()) => report.push(FileRecord::new(".", FileOutcome::Deleted)),
            Err(e) => report.push(FileRecord::new(".", FileOutcome::Failed(e.to_string()))),
        }
    }
    info!("Cleaned {}", report);
    Ok(report)
}

/// Refuse to mirror a tree into itself or over its own ancestor.
fn ensure_disjoint(core_root: &Path, target: &Path) -> Result<()> {
    if target.starts_with(core_root) || core_root.starts_with(target) {
        return Err(Error::Path {
            message: format!(
                "Mirror target '{}' overlaps core tree '{}'",
                target.display(),
                core_root.display()
            ),
        });
    }
    Ok(())
}
