//! src/error.rs
//! ============================================================================
//! # AppError: Unified Error Type for the Size Explorer
//!
//! This module defines the error enum (`AppError`) used across the crate.
//! Each variant carries enough context for diagnostics, and all fallible
//! modules are expected to use `Result<T, AppError>` for consistency.

use std::{io, path::PathBuf};
use thiserror::Error;

/// Unified error type for all explorer operations.
#[derive(Debug, Error)]
pub enum AppError {
    /// Standard IO error, auto-converted from `io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

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

    /// Serialization or deserialization error for the scan store.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Scan store read/write failure with path.
    #[error("Scan store error on {path:?}: {source}")]
    Store {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Unexpected failure during scan orchestration.
    #[error("Scan failed for {path:?}: {message}")]
    Scan { path: PathBuf, message: String },

    /// Recursive deletion failure.
    #[error("Failed to delete {path:?}: {message}")]
    Delete { path: PathBuf, message: String },

    /// Terminal I/O or rendering error.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Interactive mode started without a TTY attached.
    #[error("Interactive mode requires a terminal (stdout is not a TTY)")]
    NotATty,

    /// Any other error, with description.
    #[error("Unexpected error: {0}")]
    Other(String),
}

// Allow conversion from `anyhow::Error` as fallback.
impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Other(e.to_string())
    }
}
