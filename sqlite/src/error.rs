//! Error types for database inspection.
//!
//! Separates user input errors (missing or non-file paths) from failures
//! reported by the SQLite engine itself.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while opening or inspecting a database.
#[derive(Debug, Error)]
pub enum InspectError {
    /// The database path does not exist.
    #[error("Database file not found: {}", .0.display())]
    DatabaseNotFound(PathBuf),

    /// The database path exists but is not a regular file.
    #[error("Path is not a file: {}", .0.display())]
    NotAFile(PathBuf),

    /// SQLite failed while connecting, querying, or reading a row.
    #[error("Error reading database: {0}")]
    Database(#[from] rusqlite::Error),
}

impl InspectError {
    /// Returns `true` for errors caused by the supplied path rather than
    /// the database contents.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            InspectError::DatabaseNotFound(_) | InspectError::NotAFile(_)
        )
    }
}

/// Convenience alias for results with [`InspectError`].
pub type Result<T> = std::result::Result<T, InspectError>;
