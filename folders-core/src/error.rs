//! src/error.rs
//! ============================================================================
//! # AppError: Unified Error Type for the Folder View Engine
//!
//! This module defines the comprehensive error enum (`AppError`) used across
//! the crate. Each variant carries rich context for diagnostics, and all major
//! modules are expected to use `Result<T, AppError>` for consistency.
//!
//! Note that several conditions the engine encounters are deliberately *not*
//! errors: duplicate creation events, modify/delete events for untracked
//! paths, and removal of the watched directory itself are absorbed by the
//! synchronizer with a log line, keeping the visible icon list consistent.

use std::{io, path::PathBuf};
use thiserror::Error;

/// Unified error type for all folder view operations.
#[derive(Debug, Error)]
pub enum AppError {
    /// Standard IO error, auto-converted from `io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Requested file or directory does not exist. Raised when a path
    /// vanishes between enumeration and resolution; callers skip the entry.
    #[error("File or directory not found: {0:?}")]
    NotFound(PathBuf),

    /// Error retrieving file or directory metadata.
    #[error("Filesystem metadata error on {path:?}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Malformed shortcut (`.desktop`) file. Non-fatal: the record keeps its
    /// resolver defaults.
    #[error("Shortcut parse error in {path:?}: {reason}")]
    Parse { path: PathBuf, reason: String },

    /// Filesystem watch registration or delivery failure.
    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    /// TOML config parsing error.
    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    /// Config file I/O error with path.
    #[error("Failed to read config file {path:?}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Async task failure or join error.
    #[error("Async task failed: {0}")]
    Task(String),

    /// Any other error, with description.
    #[error("Unexpected error: {0}")]
    Other(String),
}

impl AppError {
    /// Attach extra context to an error.
    pub fn with_context<S: Into<String>>(self, ctx: S) -> AppError {
        AppError::Other(format!("{}: {}", ctx.into(), self))
    }

    /// Map an `io::Error` from a metadata call, promoting `NotFound` to the
    /// dedicated variant so callers can skip vanished entries silently.
    pub fn from_metadata(path: &std::path::Path, source: io::Error) -> AppError {
        if source.kind() == io::ErrorKind::NotFound {
            AppError::NotFound(path.to_path_buf())
        } else {
            AppError::Metadata {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

// Allow conversion from `anyhow::Error` as fallback.
impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Other(e.to_string())
    }
}
