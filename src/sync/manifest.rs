//! Record of core files copied into a site tree
//!
//! The manifest is a JSON array of `{ "path", "hash" }` objects: the
//! `/`-separated path relative to the synchronized directory and the SHA-256
//! of the content as copied. Entries keep enumeration order. The format is
//! private to this crate: the only promise is that the next run can read what
//! this run wrote.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::cache::write_replacing;
use crate::error::{Error, Result};
use crate::path::{ensure_contained, to_posix};

/// File name of the manifest inside a merge-once target directory.
pub const MANIFEST_FILE: &str = ".theme-overlay-manifest.json";

/// One tracked copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub path: String,
    /// Content hash at the time of the copy.
    pub hash: String,
}

/// Ordered set of relative paths owned by the synchronizer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
    index: HashMap<String, usize>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a path; a path already present keeps its first hash.
    pub fn insert<P: AsRef<Path>>(&mut self, path: P, hash: impl Into<String>) {
        let posix = to_posix(path.as_ref());
        if self.index.contains_key(&posix) {
            return;
        }
        self.index.insert(posix.clone(), self.entries.len());
        self.entries.push(ManifestEntry {
            path: posix,
            hash: hash.into(),
        });
    }

    pub fn contains<P: AsRef<Path>>(&self, path: P) -> bool {
        self.index.contains_key(&to_posix(path.as_ref()))
    }

    /// Recorded content hash of a tracked path.
    pub fn hash<P: AsRef<Path>>(&self, path: P) -> Option<&str> {
        self.index
            .get(&to_posix(path.as_ref()))
            .map(|&i| self.entries[i].hash.as_str())
    }

    /// Paths in insertion order.
    pub fn paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.entries.iter().map(|e| PathBuf::from(&e.path))
    }

    /// Tracked paths as stored, `/`-separated.
    pub fn files(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.path.as_str()).collect()
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read the manifest at `path`.
    ///
    /// A missing or malformed manifest is empty. Entries that are absolute or
    /// climb out of the directory are dropped so they can never be deleted.
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::new(),
            Err(e) => {
                warn!("Cannot read manifest {}: {}", path.display(), e);
                return Self::new();
            }
        };

        let raw: Vec<ManifestEntry> = match serde_json::from_str(&content) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    "Ignoring malformed manifest {}: {}; treating it as empty",
                    path.display(),
                    e
                );
                return Self::new();
            }
        };

        let mut manifest = Self::new();
        for entry in raw {
            let entry_path = Path::new(&entry.path);
            if entry.path.is_empty() || ensure_contained(entry_path).is_err() {
                warn!("Dropping manifest entry outside its directory: {}", entry.path);
                continue;
            }
            manifest.insert(entry_path, entry.hash);
        }
        manifest
    }

    /// Persist the manifest, replacing the previous file in a single rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        write_replacing(path, json.as_bytes()).map_err(|e| Error::Manifest {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}
