//! Fixtures for the integration and CLI tests.
//!
//! This module provides a site fixture with a shared core next to it, plus
//! helpers to drive the `theme-overlay` binary against it.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new()
//!         .with_core_file("_includes/footer.njk", "footer")
//!         .with_minimal_config();
//!     fixture.command().arg("sync").assert().success();
//! }
//! ```

#![allow(dead_code)]

use assert_fs::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Everything a test file needs after `mod common;`.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::configs;
    #[allow(unused_imports)]
    pub use super::{set_mtime_in_future, TestFixture};
}

/// `.theme-overlay.yaml` bodies shared across tests.
pub mod configs {
    /// Core next to the site, everything else defaulted.
    pub const MINIMAL: &str = "core_src: core\n";

    /// Core plus an overlay tier.
    pub const WITH_OVERLAY: &str = "core_src: core\noverlay_src: overlay\n";

    /// Unterminated flow sequence.
    pub const INVALID_YAML: &str = "core_src: [unclosed";

    /// Valid YAML with a namespace that would escape the layouts directory.
    pub const BAD_NAMESPACE: &str = "core_src: core\nlayouts_namespace: ../escape\n";
}

/// Push a file's modification time a minute into the future.
///
/// Filesystems with coarse timestamps can give a file written right after a
/// sync the same time as the sync marker; this makes the change observable.
pub fn set_mtime_in_future(path: &Path) {
    fs::File::options()
        .write(true)
        .open(path)
        .expect("Failed to open file")
        .set_modified(SystemTime::now() + Duration::from_secs(60))
        .expect("Failed to set mtime");
}

/// A temporary site directory with a `core/` tree beside its `src/`.
///
/// Layout inside the temp dir:
///
/// ```text
/// .theme-overlay.yaml
/// core/_includes, core/_layouts   (shared core)
/// src/_includes, src/_layouts     (site)
/// ```
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("create fixture dir"),
        }
    }

    /// Add a `.theme-overlay.yaml` configuration file with the given content.
    pub fn with_config(self, content: &str) -> Self {
        self.temp_dir
            .child(".theme-overlay.yaml")
            .write_str(content)
            .expect("write .theme-overlay.yaml");
        self
    }

    /// `core_src: core` and nothing else.
    pub fn with_minimal_config(self) -> Self {
        self.with_config(configs::MINIMAL)
    }

    /// Add a file below `core/`.
    pub fn with_core_file(self, path: &str, content: &str) -> Self {
        self.write(&format!("core/{}", path), content);
        self
    }

    /// Add a file below the site's `src/`.
    pub fn with_site_file(self, path: &str, content: &str) -> Self {
        self.write(&format!("src/{}", path), content);
        self
    }

    /// Add a file anywhere below the fixture root.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.write(path, content);
        self
    }

    /// Write a file relative to the fixture root, creating parents.
    pub fn write(&self, path: &str, content: &str) {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("write fixture file");
    }

    /// Remove a file relative to the fixture root.
    pub fn remove(&self, path: &str) {
        fs::remove_file(self.path().join(path)).expect("Failed to remove file");
    }

    /// Read a file relative to the fixture root.
    pub fn read(&self, path: &str) -> String {
        fs::read_to_string(self.path().join(path)).expect("Failed to read file")
    }

    /// Whether a path relative to the fixture root exists.
    pub fn exists(&self, path: &str) -> bool {
        self.path().join(path).exists()
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join(".theme-overlay.yaml")
    }

    pub fn core(&self) -> PathBuf {
        self.path().join("core")
    }

    pub fn site(&self) -> PathBuf {
        self.path().join("src")
    }

    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// The binary, run from the fixture root with colors off and no config
    /// override from the environment.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("theme-overlay");
        cmd.current_dir(self.path());
        cmd.env_remove("THEME_OVERLAY_CONFIG");
        cmd.env_remove("RUST_LOG");
        cmd.arg("--color").arg("never");
        cmd
    }

    /// Like [`command`](Self::command), with an explicit `--config`.
    pub fn command_with_config(&self) -> assert_cmd::Command {
        let mut cmd = self.command();
        cmd.arg("--config").arg(self.config_path());
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
