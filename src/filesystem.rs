//! On-disk file trees
//!
//! A [`FileTree`] is a directory treated as a namespace of relative paths.
//! Enumeration is recursive, skips paths matched by an [`IgnoreSet`], and
//! always returns paths sorted by their `/`-separated form so every run sees
//! the same order.
//!
//! Several trees stacked in precedence order (overlay over core) are read
//! together with [`layered_files`].

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use glob::Pattern;
use rayon::prelude::*;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::path::{template_extension, to_posix};

/// Glob patterns excluded from enumeration, matched against `/`-separated
/// relative paths.
#[derive(Debug, Clone, Default)]
pub struct IgnoreSet {
    patterns: Vec<Pattern>,
}

impl IgnoreSet {
    /// Compile a list of glob patterns.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| Pattern::new(p.as_ref()).map_err(Error::Glob))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// An ignore set that matches nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether a relative path is ignored.
    pub fn is_ignored(&self, relative: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(relative))
    }
}

/// A directory root viewed as a set of relative file paths.
#[derive(Debug, Clone)]
pub struct FileTree {
    root: PathBuf,
    ignore: IgnoreSet,
    optional: bool,
}

impl FileTree {
    /// Create a tree rooted at `root` with nothing ignored.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            ignore: IgnoreSet::empty(),
            optional: false,
        }
    }

    /// Treat a missing root as an empty tree instead of an error.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Replace the ignore set.
    pub fn with_ignore(mut self, ignore: IgnoreSet) -> Self {
        self.ignore = ignore;
        self
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the root exists as a directory.
    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    /// Absolute path of a relative entry.
    pub fn join<P: AsRef<Path>>(&self, relative: P) -> PathBuf {
        self.root.join(relative)
    }

    /// Whether anything occupies `relative` in this tree.
    pub fn contains<P: AsRef<Path>>(&self, relative: P) -> bool {
        fs::symlink_metadata(self.join(relative)).is_ok()
    }

    /// List every file under the root as relative paths in sorted order.
    ///
    /// Fails with [`Error::CoreEnumeration`] when the root is missing or any
    /// directory below it cannot be read.
    /// An [`optional`](Self::optional) tree with a missing root is empty.
    pub fn list_files(&self) -> Result<Vec<PathBuf>> {
        if !self.exists() {
            if self.optional {
                return Ok(Vec::new());
            }
            return Err(Error::CoreEnumeration {
                path: self.root.clone(),
                message: "directory does not exist".to_string(),
            });
        }

        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(&self.root).follow_links(true) {
            let entry = entry.map_err(|e| Error::CoreEnumeration {
                path: self.root.clone(),
                message: e.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|_| Error::Path {
                    message: format!("Failed to make path relative: {}", entry.path().display()),
                })?;
            let posix = to_posix(relative);
            if self.ignore.is_ignored(&posix) {
                continue;
            }
            files.push((posix, relative.to_path_buf()));
        }

        files.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(files.into_iter().map(|(_, path)| path).collect())
    }

    /// List template files (recognized extension, no hidden components).
    pub fn list_templates(&self) -> Result<Vec<PathBuf>> {
        Ok(self
            .list_files()?
            .into_iter()
            .filter(|rel| !is_hidden(rel))
            .filter(|rel| {
                rel.file_name()
                    .and_then(|n| n.to_str())
                    .and_then(template_extension)
                    .is_some()
            })
            .collect())
    }

    /// Newest modification time across the tree, probed in parallel.
    ///
    /// Directories count as well as files: removing or renaming an entry only
    /// touches its parent directory. Entries whose metadata cannot be read
    /// contribute nothing. Fails like [`list_files`](Self::list_files) when
    /// the tree cannot be walked. A missing optional root reports the time of
    /// its parent directory, so removing the whole tree is still noticed.
    pub fn max_modified(&self) -> Result<Option<SystemTime>> {
        if !self.exists() {
            if self.optional {
                return Ok(self.root.parent().and_then(modified));
            }
            return Err(Error::CoreEnumeration {
                path: self.root.clone(),
                message: "directory does not exist".to_string(),
            });
        }

        let mut entries = Vec::new();
        for entry in walkdir::WalkDir::new(&self.root).follow_links(true) {
            let entry = entry.map_err(|e| Error::CoreEnumeration {
                path: self.root.clone(),
                message: e.to_string(),
            })?;
            let ignored = entry
                .path()
                .strip_prefix(&self.root)
                .map(|rel| entry.depth() > 0 && self.ignore.is_ignored(&to_posix(rel)))
                .unwrap_or(false);
            if !ignored {
                entries.push(entry.into_path());
            }
        }

        Ok(entries.par_iter().filter_map(|path| modified(path)).max())
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// A file taken from one of several stacked trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayeredFile {
    /// Path relative to the tree roots.
    pub relative: PathBuf,
    /// Absolute path in the tree that supplies it.
    pub source: PathBuf,
}

/// Union of the files of `layers`, given in precedence order.
///
/// For each relative path the first tree holding it supplies the file.
/// Results are sorted like [`FileTree::list_files`].
pub fn layered_files(layers: &[FileTree]) -> Result<Vec<LayeredFile>> {
    let mut files = BTreeMap::new();
    for tree in layers {
        for relative in tree.list_files()? {
            files.entry(to_posix(&relative)).or_insert_with(|| LayeredFile {
                source: tree.join(&relative),
                relative,
            });
        }
    }
    Ok(files.into_values().collect())
}

/// Newest modification time across all `layers`.
pub fn layered_max_modified(layers: &[FileTree]) -> Result<Option<SystemTime>> {
    let mut newest = None;
    for tree in layers {
        newest = newest.max(tree.max_modified()?);
    }
    Ok(newest)
}

/// Hex SHA-256 of a file's content.
pub fn content_hash(path: &Path) -> io::Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Whether any component of a relative path starts with a dot.
pub fn is_hidden(relative: &Path) -> bool {
    relative
        .components()
        .any(|c| c.as_os_str().to_str().is_some_and(|s| s.starts_with('.')))
}

/// Copy `src` to `dst`, creating parent directories as needed.
pub fn copy_file(src: &Path, dst: &Path) -> Result<u64> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::Filesystem {
            message: format!("Failed to create directory '{}': {}", parent.display(), e),
        })?;
    }
    fs::copy(src, dst).map_err(|e| Error::Filesystem {
        message: format!(
            "Failed to copy '{}' to '{}': {}",
            src.display(),
            dst.display(),
            e
        ),
    })
}

/// Remove a directory tree; succeeds when it is already absent.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Filesystem {
            message: format!("Failed to remove '{}': {}", path.display(), e),
        }),
    }
}
