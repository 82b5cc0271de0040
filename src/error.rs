//! Error types for the smaug size-analysis pipeline.
//!
//! Each pipeline stage owns a small thiserror enum; the crate-level
//! [`Error`] unites them so the top-level `run` can propagate with `?`.
//! None of these are retryable: re-running any stage against the same
//! inputs cannot succeed where the first attempt failed.

use thiserror::Error;

/// Invalid analysis configuration. Fatal to the run.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No input files were supplied.
    #[error("no input files given")]
    NoInputs,

    /// A requested data source name is not one we know how to attribute.
    #[error("unrecognized data source: {0:?}")]
    UnknownDataSource(String),

    /// No hierarchy levels were requested.
    #[error("no data sources given")]
    NoDataSources,
}

/// Failure to read or interpret an input binary. Surfaced verbatim,
/// never retried.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The file could not be opened or mapped.
    #[error("unreadable input {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The file is readable but not an object format we recognize.
    #[error("unsupported format for {path}: {message}")]
    UnsupportedFormat { path: String, message: String },

    /// The file claims to be an object but its structure is broken.
    #[error("corrupt binary {path}: {message}")]
    Corrupt { path: String, message: String },
}

/// Failure to serialize a report into an owned transport buffer.
/// Distinguishable from a successful-but-empty report.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The report text contains an interior NUL and cannot be carried
    /// as a NUL-terminated buffer.
    #[error("report contains interior NUL at byte {0}")]
    InteriorNul(usize),

    /// The report exceeds the maximum representable buffer length.
    #[error("report of {0} bytes exceeds transport limits")]
    TooLarge(usize),

    /// JSON serialization of the report tree failed.
    #[error("report serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Crate-level error for the full pipeline.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Result type alias for smaug operations.
pub type Result<T> = std::result::Result<T, Error>;
