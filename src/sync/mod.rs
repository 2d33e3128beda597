//! # Overlay Synchronization
//!
//! Hosts that cannot search several roots need core files to physically
//! exist inside the site tree. This module puts them there with one of two
//! strategies, chosen per namespace:
//!
//! - **Mirror** ([`mirror`]): delete the namespace directory and copy the
//!   whole source tree (overlay stacked over core) into it, gated by the change-detection cache. Used for
//!   layouts, which live in an isolated subfolder and never mix with site
//!   files.
//! - **Merge-once** ([`merge`]): copy each core file only where the site has
//!   nothing at that path, remember what was copied and its content hash in
//!   a [`Manifest`], and delete remembered files once no source ships them. Used for includes, where
//!   core partials must sit next to site partials.
//!
//! ## Failure model
//!
//! Every copy or delete produces a [`FileRecord`]. Failures are recorded, not
//! raised, so a pass always runs to completion and hands back a
//! [`SyncReport`] for the caller to judge. Persisted state (manifest, marker)
//! is written last, only after every file operation has finished.

pub mod manifest;
pub mod merge;
pub mod mirror;

pub use manifest::Manifest;

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// How a namespace is synchronized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    Mirror,
    MergeOnce,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Mirror => f.write_str("mirror"),
            Strategy::MergeOnce => f.write_str("merge-once"),
        }
    }
}

/// Result of a single file operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "kebab-case")]
pub enum FileOutcome {
    Copied,
    Deleted,
    Skipped(String),
    Failed(String),
}

/// A file operation and how it ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// Path relative to the synchronized directory.
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

impl FileRecord {
    pub fn new<P: Into<PathBuf>>(path: P, outcome: FileOutcome) -> Self {
        Self {
            path: path.into(),
            outcome,
        }
    }
}

/// Everything one synchronization pass did.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub strategy: Strategy,
    /// The synchronized directory.
    pub target: PathBuf,
    /// `false` when the pass was skipped because nothing changed.
    pub ran: bool,
    pub records: Vec<FileRecord>,
}

impl SyncReport {
    pub fn new<P: Into<PathBuf>>(strategy: Strategy, target: P) -> Self {
        Self {
            strategy,
            target: target.into(),
            ran: true,
            records: Vec::new(),
        }
    }

    /// A report for a pass that was not needed.
    pub fn up_to_date<P: Into<PathBuf>>(strategy: Strategy, target: P) -> Self {
        Self {
            ran: false,
            ..Self::new(strategy, target)
        }
    }

    pub fn push(&mut self, record: FileRecord) {
        self.records.push(record);
    }

    pub fn copied(&self) -> impl Iterator<Item = &FileRecord> {
        self.records
            .iter()
            .filter(|r| r.outcome == FileOutcome::Copied)
    }

    pub fn deleted(&self) -> impl Iterator<Item = &FileRecord> {
        self.records
            .iter()
            .filter(|r| r.outcome == FileOutcome::Deleted)
    }

    pub fn skipped(&self) -> impl Iterator<Item = &FileRecord> {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, FileOutcome::Skipped(_)))
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileRecord> {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, FileOutcome::Failed(_)))
    }

    /// Whether every file operation succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Number of copies plus deletions actually performed.
    pub fn changes(&self) -> usize {
        self.copied().count() + self.deleted().count()
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.ran {
            return write!(f, "{} {}: up to date", self.strategy, self.target.display());
        }
        write!(
            f,
            "{} {}: {} copied, {} deleted, {} skipped, {} failed",
            self.strategy,
            self.target.display(),
            self.copied().count(),
            self.deleted().count(),
            self.skipped().count(),
            self.failures().count()
        )
    }
}
