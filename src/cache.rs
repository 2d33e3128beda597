//! Change detection for mirrored namespaces
//!
//! A mirror pass is only needed when a source tree changed since the last
//! successful pass. The last pass leaves a one-line [`SyncMarker`] in the
//! mirrored directory; the sources are due for a resync when their newest
//! modification time is strictly later than the marker.
//!
//! The marker records the wall-clock time at which the pass finished, not the
//! newest core timestamp it saw. A core file touched during the copy forces
//! one extra pass on the next build instead of ever being missed.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::filesystem::{layered_max_modified, FileTree};

/// File name of the marker inside a mirrored namespace.
pub const MARKER_FILE: &str = ".theme-overlay-synced";

/// "Core state as of the last successful sync."
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SyncMarker(SystemTime);

impl SyncMarker {
    /// A marker at the current wall-clock time.
    pub fn now() -> Self {
        Self(SystemTime::now())
    }

    /// A marker at an explicit time.
    pub fn at(time: SystemTime) -> Self {
        Self(time)
    }

    /// The marker that every timestamp beats.
    pub fn epoch() -> Self {
        Self(UNIX_EPOCH)
    }

    pub fn time(&self) -> SystemTime {
        self.0
    }

    /// Nanoseconds since the Unix epoch, as stored on disk.
    fn encode(&self) -> String {
        let nanos = self
            .0
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_nanos();
        format!("{}\n", nanos)
    }

    fn decode(content: &str) -> Option<Self> {
        let nanos: u128 = content.trim().parse().ok()?;
        let secs = u64::try_from(nanos / 1_000_000_000).ok()?;
        let sub = (nanos % 1_000_000_000) as u32;
        UNIX_EPOCH
            .checked_add(Duration::new(secs, sub))
            .map(Self)
    }

    /// Read a marker; absent or malformed markers read as [`epoch`](Self::epoch).
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => Self::decode(&content).unwrap_or_else(|| {
                warn!(
                    "Ignoring unreadable sync marker {}; forcing a full resync",
                    path.display()
                );
                Self::epoch()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::epoch(),
            Err(e) => {
                warn!("Cannot read sync marker {}: {}", path.display(), e);
                Self::epoch()
            }
        }
    }

    /// Persist the marker, replacing any previous one in a single rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_replacing(path, self.encode().as_bytes()).map_err(|e| Error::Marker {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Whether any of the source `layers` changed after the marker at
/// `marker_path`.
///
/// Fails only when a required tree cannot be walked.
pub fn due_for_sync(layers: &[FileTree], marker_path: &Path) -> Result<bool> {
    let marker = SyncMarker::load(marker_path);
    let newest = layered_max_modified(layers)?;
    let due = newest.is_some_and(|newest| marker.time() < newest);
    debug!(
        "Change check for {}: marker={:?} newest={:?} due={}",
        marker_path.display(),
        marker.time(),
        newest,
        due
    );
    Ok(due)
}

/// Write `content` next to `path` and rename it into place.
///
/// A crash mid-write leaves the previous file untouched. The temp file is
/// removed when the write or the rename fails.
pub(crate) fn write_replacing(path: &Path, content: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = path.with_file_name(temp_name);
    let result = write_synced(&temp_path, content).and_then(|()| fs::rename(&temp_path, path));
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn write_synced(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(content)?;
    file.sync_all()
}
