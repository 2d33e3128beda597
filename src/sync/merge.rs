//! Merge-once synchronization
//!
//! Source files are copied into the site directory only where the site has
//! nothing at that path, so site-authored files always win and are never
//! touched. Sources are one or more stacked trees (an overlay over core); the
//! first tree holding a path supplies it. Files copied by an earlier pass are
//! tracked in the [`Manifest`] together with their content hash; when no
//! source ships one any more, the pass deletes it.
//!
//! A pass runs in three steps: build a [`MergePlan`] without touching the
//! disk, copy, then delete stale entries. The new manifest is written only
//! after both steps finished, so a crash mid-pass leaves the previous manifest
//! in place.
//!
//! A tracked file whose content no longer matches the recorded hash was
//! edited after the pass that copied it. It is treated as adopted by the
//! site: dropped from the manifest and left on disk. Timestamps play no part,
//! so a checkout or `touch` that keeps the content does not adopt anything.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;

use super::manifest::{Manifest, MANIFEST_FILE};
use super::{FileOutcome, FileRecord, Strategy, SyncReport};
use crate::error::Result;
use crate::filesystem::{content_hash, copy_file, layered_files, FileTree};
use crate::path::to_posix;

/// What a merge-once pass would do, computed without side effects.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergePlan {
    /// Source files absent from the site; they will be copied.
    pub to_copy: Vec<PathBuf>,
    /// Tracked files still shipped and unchanged on disk.
    pub retained: Vec<PathBuf>,
    /// Tracked files edited since they were copied; tracking stops.
    pub adopted: Vec<PathBuf>,
    /// Site-authored files shadowing a source file; never touched.
    pub shadowed: Vec<PathBuf>,
    /// Tracked files no source ships any more; they will be deleted.
    pub stale: Vec<PathBuf>,
    #[serde(skip)]
    sources: BTreeMap<PathBuf, PathBuf>,
    #[serde(skip)]
    previous: Manifest,
}

impl MergePlan {
    /// Whether running the plan would change anything on disk.
    pub fn is_noop(&self) -> bool {
        self.to_copy.is_empty() && self.stale.is_empty()
    }

    /// Absolute path a planned copy is taken from.
    pub fn source(&self, relative: &Path) -> Option<&Path> {
        self.sources.get(relative).map(PathBuf::as_path)
    }
}

/// Location of the manifest for a site directory.
pub fn manifest_path(site_root: &Path) -> PathBuf {
    site_root.join(MANIFEST_FILE)
}

/// Compute the copy and delete sets for one pass from a single tree.
///
/// Fails only when the tree cannot be enumerated.
pub fn plan(core: &FileTree, site_root: &Path) -> Result<MergePlan> {
    plan_layers(std::slice::from_ref(core), site_root)
}

/// Compute the copy and delete sets for stacked source trees, highest
/// precedence first.
pub fn plan_layers(layers: &[FileTree], site_root: &Path) -> Result<MergePlan> {
    let files: Vec<_> = layered_files(layers)?
        .into_iter()
        .filter(|f| f.relative.as_path() != Path::new(MANIFEST_FILE))
        .collect();
    let previous = Manifest::load(&manifest_path(site_root));
    let site = FileTree::new(site_root);

    let mut plan = MergePlan::default();
    for file in &files {
        let rel = &file.relative;
        if !site.contains(rel) {
            plan.to_copy.push(rel.clone());
            plan.sources.insert(rel.clone(), file.source.clone());
        } else if !previous.contains(rel) {
            plan.shadowed.push(rel.clone());
        } else if edited(&site.join(rel), previous.hash(rel)) {
            plan.adopted.push(rel.clone());
        } else {
            plan.retained.push(rel.clone());
        }
    }

    let upstream: HashSet<String> = files.iter().map(|f| to_posix(&f.relative)).collect();
    plan.stale = previous
        .paths()
        .filter(|rel| !upstream.contains(&to_posix(rel)))
        .collect();
    plan.previous = previous;

    Ok(plan)
}

/// Run a merge-once pass from `core` into `site_root`.
pub fn sync(core: &FileTree, site_root: &Path) -> Result<SyncReport> {
    sync_layers(std::slice::from_ref(core), site_root)
}

/// Run a merge-once pass from stacked source trees into `site_root`.
pub fn sync_layers(layers: &[FileTree], site_root: &Path) -> Result<SyncReport> {
    let plan = plan_layers(layers, site_root)?;
    Ok(execute(&plan, site_root))
}

/// Carry out a plan produced by [`plan`] or [`plan_layers`].
///
/// The written manifest holds the files copied now, the retained files, and
/// stale files whose deletion failed so the next pass retries them.
pub fn execute(plan: &MergePlan, site_root: &Path) -> SyncReport {
    let mut report = SyncReport::new(Strategy::MergeOnce, site_root);
    let mut next = Manifest::new();
    for rel in &plan.retained {
        if let Some(hash) = plan.previous.hash(rel) {
            next.insert(rel, hash);
        }
    }

    let copies: Vec<(FileRecord, Option<String>)> = plan
        .to_copy
        .par_iter()
        .map(|rel| match copy_tracked(plan.source(rel), &site_root.join(rel)) {
            Ok(hash) => {
                debug!("Copied {}", to_posix(rel));
                (FileRecord::new(rel, FileOutcome::Copied), Some(hash))
            }
            Err(message) => {
                warn!("Failed to copy {}: {}", to_posix(rel), message);
                (FileRecord::new(rel, FileOutcome::Failed(message)), None)
            }
        })
        .collect();
    for (record, hash) in copies {
        if let Some(hash) = hash {
            next.insert(&record.path, hash);
        }
        report.push(record);
    }

    for rel in &plan.adopted {
        info!(
            "Keeping {}: edited after the last sync, now owned by the site",
            to_posix(rel)
        );
        report.push(FileRecord::new(
            rel,
            FileOutcome::Skipped(ADOPTED.to_string()),
        ));
    }

    for rel in &plan.stale {
        let hash = plan.previous.hash(rel);
        let record = remove_tracked(site_root, rel, hash);
        if let (FileOutcome::Failed(_), Some(hash)) = (&record.outcome, hash) {
            next.insert(rel, hash);
        }
        report.push(record);
    }

    if let Err(e) = next.save(&manifest_path(site_root)) {
        warn!("{}", e);
        report.push(FileRecord::new(
            MANIFEST_FILE,
            FileOutcome::Failed(e.to_string()),
        ));
    }

    info!("{}", report);
    report
}

/// Delete every tracked file and the manifest itself.
pub fn clean(site_root: &Path) -> SyncReport {
    let mut report = SyncReport::new(Strategy::MergeOnce, site_root);
    let manifest_file = manifest_path(site_root);
    let manifest = Manifest::load(&manifest_file);

    for rel in manifest.paths() {
        report.push(remove_tracked(site_root, &rel, manifest.hash(&rel)));
    }

    match fs::remove_file(&manifest_file) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => report.push(FileRecord::new(
            MANIFEST_FILE,
            FileOutcome::Failed(e.to_string()),
        )),
    }

    info!("Cleaned {}", report);
    report
}

const ADOPTED: &str = "edited after last sync";
const REPLACED_BY_DIR: &str = "replaced by a directory";

/// Copy a planned file and hash what landed in the site.
fn copy_tracked(source: Option<&Path>, dst: &Path) -> std::result::Result<String, String> {
    let source = source.ok_or_else(|| "no source for planned copy".to_string())?;
    copy_file(source, dst).map_err(|e| e.to_string())?;
    content_hash(dst).map_err(|e| format!("Failed to hash '{}': {}", dst.display(), e))
}

/// Whether a tracked file's content differs from the hash recorded when it
/// was copied.
fn edited(path: &Path, recorded: Option<&str>) -> bool {
    match (recorded, content_hash(path)) {
        (Some(recorded), Ok(current)) => recorded != current,
        _ => false,
    }
}

/// Remove one tracked file unless the site adopted it.
///
/// A tracked path now holding a directory belongs to the site; it is left in
/// place and tracking stops.
fn remove_tracked(site_root: &Path, rel: &Path, recorded: Option<&str>) -> FileRecord {
    let full = site_root.join(rel);

    match fs::symlink_metadata(&full) {
        Ok(meta) if meta.is_dir() => {
            warn!(
                "Tracked file {} is now a directory; no longer tracking it",
                full.display()
            );
            return FileRecord::new(rel, FileOutcome::Skipped(REPLACED_BY_DIR.to_string()));
        }
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return FileRecord::new(rel, FileOutcome::Skipped("already absent".to_string()));
        }
        Err(e) => {
            warn!("Cannot inspect {}: {}", full.display(), e);
            return FileRecord::new(rel, FileOutcome::Failed(e.to_string()));
        }
    }

    if edited(&full, recorded) {
        info!(
            "Keeping {}: edited after the last sync, now owned by the site",
            to_posix(rel)
        );
        return FileRecord::new(rel, FileOutcome::Skipped(ADOPTED.to_string()));
    }

    match fs::remove_file(&full) {
        Ok(()) => {
            debug!("Deleted {}", to_posix(rel));
            prune_empty_parents(site_root, rel);
            FileRecord::new(rel, FileOutcome::Deleted)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            FileRecord::new(rel, FileOutcome::Skipped("already absent".to_string()))
        }
        Err(e) => {
            warn!("Failed to delete {}: {}", full.display(), e);
            FileRecord::new(rel, FileOutcome::Failed(e.to_string()))
        }
    }
}

/// Remove directories emptied by a deletion, stopping at the site root.
fn prune_empty_parents(site_root: &Path, rel: &Path) {
    let mut current = rel.parent();
    while let Some(dir) = current {
        if dir.as_os_str().is_empty() || fs::remove_dir(site_root.join(dir)).is_err() {
            break;
        }
        current = dir.parent();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        core: PathBuf,
        overlay: PathBuf,
        site: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let core = temp.path().join("core/_includes");
            let overlay = temp.path().join("overlay/_includes");
            let site = temp.path().join("site/_includes");
            fs::create_dir_all(&core).unwrap();
            Self {
                _temp: temp,
                core,
                overlay,
                site,
            }
        }

        fn core_file(&self, rel: &str, content: &str) {
            write(&self.core.join(rel), content);
        }

        fn overlay_file(&self, rel: &str, content: &str) {
            write(&self.overlay.join(rel), content);
        }

        fn site_file(&self, rel: &str, content: &str) {
            write(&self.site.join(rel), content);
        }

        fn tree(&self) -> FileTree {
            FileTree::new(&self.core)
        }

        fn layers(&self) -> Vec<FileTree> {
            vec![FileTree::new(&self.overlay).optional(), self.tree()]
        }

        fn tracked(&self) -> Vec<String> {
            Manifest::load(&manifest_path(&self.site))
                .files()
                .into_iter()
                .map(String::from)
                .collect()
        }
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn set_mtime_in_future(path: &Path) {
        fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(SystemTime::now() + Duration::from_secs(60))
            .unwrap();
    }

    #[test]
    fn test_copies_missing_and_skips_site_files() {
        let fx = Fixture::new();
        fx.core_file("header.njk", "core header");
        fx.core_file("footer.njk", "core footer");
        fx.site_file("header.njk", "site header");

        let report = sync(&fx.tree(), &fx.site).unwrap();

        assert_eq!(report.copied().count(), 1);
        assert_eq!(
            fs::read_to_string(fx.site.join("footer.njk")).unwrap(),
            "core footer"
        );
        assert_eq!(
            fs::read_to_string(fx.site.join("header.njk")).unwrap(),
            "site header"
        );
        assert_eq!(fx.tracked(), ["footer.njk"]);
    }

    #[test]
    fn test_manifest_records_content_hash() {
        let fx = Fixture::new();
        fx.core_file("footer.njk", "core footer");
        sync(&fx.tree(), &fx.site).unwrap();

        let manifest = Manifest::load(&manifest_path(&fx.site));
        let expected = content_hash(&fx.core.join("footer.njk")).unwrap();
        assert_eq!(manifest.hash("footer.njk"), Some(expected.as_str()));
    }

    #[test]
    fn test_plan_has_no_side_effects() {
        let fx = Fixture::new();
        fx.core_file("footer.njk", "core footer");

        let plan = plan(&fx.tree(), &fx.site).unwrap();
        assert_eq!(plan.to_copy, vec![PathBuf::from("footer.njk")]);
        assert_eq!(
            plan.source(Path::new("footer.njk")),
            Some(fx.core.join("footer.njk").as_path())
        );
        assert!(!fx.site.exists());
    }

    #[test]
    fn test_second_pass_keeps_tracking_and_copies_nothing() {
        let fx = Fixture::new();
        fx.core_file("footer.njk", "core footer");

        sync(&fx.tree(), &fx.site).unwrap();
        let report = sync(&fx.tree(), &fx.site).unwrap();

        assert_eq!(report.changes(), 0);
        assert_eq!(fx.tracked(), ["footer.njk"]);
    }

    #[test]
    fn test_overlay_include_wins_over_core() {
        let fx = Fixture::new();
        fx.overlay_file("header.njk", "brand header");
        fx.core_file("header.njk", "core header");
        fx.core_file("footer.njk", "core footer");

        sync_layers(&fx.layers(), &fx.site).unwrap();

        assert_eq!(
            fs::read_to_string(fx.site.join("header.njk")).unwrap(),
            "brand header"
        );
        assert_eq!(
            fs::read_to_string(fx.site.join("footer.njk")).unwrap(),
            "core footer"
        );
        assert_eq!(fx.tracked(), ["footer.njk", "header.njk"]);
    }

    #[test]
    fn test_missing_overlay_falls_back_to_core() {
        let fx = Fixture::new();
        fx.core_file("header.njk", "core header");

        let report = sync_layers(&fx.layers(), &fx.site).unwrap();
        assert_eq!(report.copied().count(), 1);
        assert_eq!(
            fs::read_to_string(fx.site.join("header.njk")).unwrap(),
            "core header"
        );
    }

    #[test]
    fn test_file_dropped_from_overlay_stays_while_core_ships_it() {
        let fx = Fixture::new();
        fx.overlay_file("header.njk", "brand header");
        fx.core_file("header.njk", "core header");
        sync_layers(&fx.layers(), &fx.site).unwrap();

        fs::remove_file(fx.overlay.join("header.njk")).unwrap();
        let report = sync_layers(&fx.layers(), &fx.site).unwrap();

        assert_eq!(report.deleted().count(), 0);
        assert_eq!(fx.tracked(), ["header.njk"]);
    }

    #[test]
    fn test_removed_upstream_is_deleted_after_idle_pass() {
        let fx = Fixture::new();
        fx.core_file("footer.njk", "core footer");

        sync(&fx.tree(), &fx.site).unwrap();
        sync(&fx.tree(), &fx.site).unwrap();
        fs::remove_file(fx.core.join("footer.njk")).unwrap();
        let report = sync(&fx.tree(), &fx.site).unwrap();

        assert_eq!(report.deleted().count(), 1);
        assert!(!fx.site.join("footer.njk").exists());
        assert!(fx.tracked().is_empty());
    }

    #[test]
    fn test_touched_copy_with_same_content_is_still_deleted() {
        let fx = Fixture::new();
        fx.core_file("footer.njk", "core footer");
        sync(&fx.tree(), &fx.site).unwrap();

        // A checkout or `touch` moves the timestamp but keeps the bytes.
        set_mtime_in_future(&fx.site.join("footer.njk"));
        let report = sync(&fx.tree(), &fx.site).unwrap();
        assert_eq!(report.skipped().count(), 0);
        assert_eq!(fx.tracked(), ["footer.njk"]);

        fs::remove_file(fx.core.join("footer.njk")).unwrap();
        let report = sync(&fx.tree(), &fx.site).unwrap();
        assert_eq!(report.deleted().count(), 1);
        assert!(!fx.site.join("footer.njk").exists());
    }

    #[test]
    fn test_adopted_file_is_kept() {
        let fx = Fixture::new();
        fx.core_file("footer.njk", "core footer");
        sync(&fx.tree(), &fx.site).unwrap();

        let site_footer = fx.site.join("footer.njk");
        fs::write(&site_footer, "edited by site").unwrap();
        fs::remove_file(fx.core.join("footer.njk")).unwrap();

        let report = sync(&fx.tree(), &fx.site).unwrap();
        assert_eq!(report.skipped().count(), 1);
        assert_eq!(fs::read_to_string(&site_footer).unwrap(), "edited by site");
        assert!(fx.tracked().is_empty());
    }

    #[test]
    fn test_edit_before_upstream_removal_survives_later_passes() {
        let fx = Fixture::new();
        fx.core_file("footer.njk", "core footer");
        sync(&fx.tree(), &fx.site).unwrap();

        let site_footer = fx.site.join("footer.njk");
        fs::write(&site_footer, "edited by site").unwrap();

        let report = sync(&fx.tree(), &fx.site).unwrap();
        assert_eq!(report.skipped().count(), 1);
        assert!(fx.tracked().is_empty());

        fs::remove_file(fx.core.join("footer.njk")).unwrap();
        let report = sync(&fx.tree(), &fx.site).unwrap();
        assert_eq!(report.deleted().count(), 0);
        assert_eq!(fs::read_to_string(&site_footer).unwrap(), "edited by site");
    }

    #[test]
    fn test_stale_path_replaced_by_directory_is_dropped() {
        let fx = Fixture::new();
        fx.core_file("widget.njk", "core widget");
        sync(&fx.tree(), &fx.site).unwrap();

        fs::remove_file(fx.site.join("widget.njk")).unwrap();
        fx.site_file("widget.njk/index.njk", "site widget");
        fs::remove_file(fx.core.join("widget.njk")).unwrap();

        let report = sync(&fx.tree(), &fx.site).unwrap();
        assert_eq!(report.failures().count(), 0);
        assert_eq!(report.skipped().count(), 1);
        assert!(fx.tracked().is_empty());
        assert!(fx.site.join("widget.njk/index.njk").exists());

        let report = sync(&fx.tree(), &fx.site).unwrap();
        assert_eq!(report.changes(), 0);
        assert_eq!(report.failures().count(), 0);
    }

    #[test]
    fn test_deleted_site_copy_is_restored() {
        let fx = Fixture::new();
        fx.core_file("footer.njk", "core footer");
        sync(&fx.tree(), &fx.site).unwrap();
        fs::remove_file(fx.site.join("footer.njk")).unwrap();

        let report = sync(&fx.tree(), &fx.site).unwrap();
        assert_eq!(report.copied().count(), 1);
        assert!(fx.site.join("footer.njk").exists());
    }

    #[test]
    fn test_nested_stale_file_prunes_empty_directories() {
        let fx = Fixture::new();
        fx.core_file("partials/nav/menu.njk", "menu");
        sync(&fx.tree(), &fx.site).unwrap();
        fs::remove_dir_all(fx.core.join("partials")).unwrap();

        sync(&fx.tree(), &fx.site).unwrap();
        assert!(!fx.site.join("partials").exists());
        assert!(fx.site.exists());
    }

    #[test]
    fn test_missing_core_is_fatal() {
        let temp = TempDir::new().unwrap();
        let result = sync(
            &FileTree::new(temp.path().join("missing")),
            &temp.path().join("site"),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_corrupt_manifest_treated_as_empty() {
        let fx = Fixture::new();
        fx.core_file("footer.njk", "core footer");
        fx.site_file(MANIFEST_FILE, "garbage");

        let report = sync(&fx.tree(), &fx.site).unwrap();
        assert_eq!(report.copied().count(), 1);
        assert_eq!(fx.tracked(), ["footer.njk"]);
    }

    #[test]
    fn test_clean_removes_tracked_files_only() {
        let fx = Fixture::new();
        fx.core_file("header.njk", "core header");
        fx.core_file("footer.njk", "core footer");
        fx.site_file("header.njk", "site header");
        sync(&fx.tree(), &fx.site).unwrap();

        let report = clean(&fx.site);
        assert_eq!(report.deleted().count(), 1);
        assert!(!fx.site.join("footer.njk").exists());
        assert!(fx.site.join("header.njk").exists());
        assert!(!manifest_path(&fx.site).exists());
    }

    #[test]
    fn test_clean_keeps_edited_copies() {
        let fx = Fixture::new();
        fx.core_file("footer.njk", "core footer");
        sync(&fx.tree(), &fx.site).unwrap();
        fs::write(fx.site.join("footer.njk"), "edited by site").unwrap();

        let report = clean(&fx.site);
        assert_eq!(report.deleted().count(), 0);
        assert!(fx.site.join("footer.njk").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_failure_is_reported_not_raised() {
        use std::os::unix::fs::PermissionsExt;

        let fx = Fixture::new();
        fx.core_file("footer.njk", "core footer");
        fx.core_file("secret.njk", "secret");
        let secret = fx.core.join("secret.njk");
        fs::set_permissions(&secret, fs::Permissions::from_mode(0o000)).unwrap();

        // Root can read anything; the failure path cannot be provoked there.
        if fs::read(&secret).is_ok() {
            return;
        }

        let report = sync(&fx.tree(), &fx.site).unwrap();
        assert_eq!(report.copied().count(), 1);
        assert_eq!(report.failures().count(), 1);
        assert_eq!(fx.tracked(), ["footer.njk"]);
    }
}
