// src/error.rs
use std::path::PathBuf;

use thiserror::Error;

/// Why gesture control could not be switched on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActivationError {
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),
    /// The frame driver of an earlier activation died and took the engine
    /// state with it.
    #[error("gesture engine lost: {0}")]
    EngineLost(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid value for {key}: {value:?}")]
    InvalidOverride { key: String, value: String },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum RecordingError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("line {line}: invalid timestamp {value:?}")]
    InvalidTimestamp { line: u64, value: String },
    #[error("line {line}, column {column}: invalid coordinate {value:?}")]
    InvalidValue {
        line: u64,
        column: usize,
        value: String,
    },
    #[error("line {line}: timestamp goes backwards")]
    OutOfOrder { line: u64 },
}
