//! Error types for schema analysis.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Errors that can occur while producing or caching an analysis.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The schemas file to analyze does not exist.
    #[error("Schemas file not found: {}", .0.display())]
    SchemasNotFound(PathBuf),

    /// The analyzer program could not be started.
    #[error("failed to start analyzer '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The analyzer program exited unsuccessfully.
    #[error("analyzer exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },

    /// The analyzer program did not finish within the configured timeout.
    #[error("analyzer timed out after {seconds}s")]
    TimedOut { seconds: u64 },

    /// The analyzer ran but reported an error in its response envelope.
    #[error("analyzer reported an error: {0}")]
    Reported(String),

    /// The analyzer's reply could not be interpreted as an analysis object.
    #[error("malformed analyzer response: {0}")]
    MalformedResponse(String),
}

/// Convenience alias for results with [`AnalyzerError`].
pub type Result<T> = std::result::Result<T, AnalyzerError>;
