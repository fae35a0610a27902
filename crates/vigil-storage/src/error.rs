//! Error taxonomy. Each variant family maps to a distinct recovery
//! policy: sampler failures are absorbed per tick, persistence failures
//! are retried on the next flush, export failures surface to the
//! caller, and configuration errors are fatal at startup.

use std::path::PathBuf;
use thiserror::Error;

/// The OS focus query failed or returned an unusable value.
///
/// Recovered locally by the tracking loop: the previously observed key
/// is assumed to still hold focus for the tick.
#[derive(Debug, Error)]
#[error("window query failed: {0}")]
pub struct SamplerError(pub String);

/// A log file could not be opened, read, or written.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("cannot open log file {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot write log file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed row {line} in log file {path}")]
    Malformed { path: PathBuf, line: usize },
}

/// A user-initiated export failed. Never affects ongoing tracking.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("nothing to export: the session has no entries")]
    EmptySession,
    #[error("unknown export format {0:?} (expected csv, json, or xml)")]
    UnknownFormat(String),
    #[error("cannot write export to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Rejected before tracking begins; the only fatal class.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be at least 1 second")]
    ZeroInterval { field: &'static str },
    #[error("application {app:?} appears in both include_apps and exclude_apps")]
    ConflictingFilters { app: String },
}
