//! # Error Handling
//!
//! This module defines the centralized error type for the `theme-overlay`
//! library. It uses `thiserror` to build a single `Error` enum whose variants
//! carry enough context (paths, keys, hints) to produce actionable messages.
//!
//! ## Key Components
//!
//! - **`Error`**: every failure the library can surface to a caller.
//! - **`Result<T>`**: alias for `std::result::Result<T, Error>`.
//!
//! Not every problem is an `Error`. Individual copy and delete failures
//! during a synchronization pass are recorded as
//! [`FileOutcome::Failed`](crate::sync::FileOutcome) entries in a
//! [`SyncReport`](crate::sync::SyncReport) and never abort the pass. The only
//! error a pass propagates is [`Error::CoreEnumeration`], raised when the
//! core tree itself cannot be listed (a broken installation of the shared
//! package).

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for theme-overlay operations
#[derive(Error, Debug)]
pub enum Error {
    /// The core tree could not be enumerated.
    ///
    /// This is the one unrecoverable failure of a synchronization pass.
    #[error("Cannot enumerate core tree '{}': {message}", path.display())]
    CoreEnumeration { path: PathBuf, message: String },

    /// A logical key is not backed by a file in any tier.
    #[error("Template not found: {key} (searched: {searched})")]
    TemplateNotFound { key: String, searched: String },

    /// The host rejected a layout alias because the key is already registered.
    #[error("Layout alias '{key}' is already registered to '{}'", existing.display())]
    AliasConflict { key: String, existing: PathBuf },

    /// The host does not support multi-root lookup for an engine.
    #[error("Template engine '{engine}' does not support search paths")]
    UnsupportedEngine { engine: String },

    /// An error occurred while loading or validating the configuration file.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Config {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// A filesystem operation on a specific path failed.
    #[error("Filesystem operation error: {message}")]
    Filesystem { message: String },

    /// An error occurred with a path-related operation.
    #[error("Path operation error: {message}")]
    Path { message: String },

    /// The manifest could not be written.
    #[error("Manifest error for '{}': {message}", path.display())]
    Manifest { path: PathBuf, message: String },

    /// The sync marker could not be written.
    #[error("Sync marker error for '{}': {message}", path.display())]
    Marker { path: PathBuf, message: String },

    /// An external pipeline step failed.
    #[error("Pipeline step '{step}' failed: {message}")]
    Pipeline { step: String, message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),
}

impl Error {
    /// Whether this error must fail the build rather than be logged.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::AliasConflict { .. } | Error::UnsupportedEngine { .. }
        )
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
