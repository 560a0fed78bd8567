//! Opening a database file for inspection.

use std::path::Path;

use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use crate::error::{InspectError, Result};

/// Opens an existing database file read-only.
///
/// The path must exist and be a regular file. Its extension is never
/// checked: SQLite recognizes its own file format from the header, so
/// files such as `powerlog.PLSQL` open the same way as `app.db`. A file
/// that is not a database opens successfully and fails on the first query
/// with [`InspectError::Database`].
///
/// # Errors
///
/// Returns [`InspectError::DatabaseNotFound`] or [`InspectError::NotAFile`]
/// for bad paths, and [`InspectError::Database`] if SQLite refuses to open
/// the file.
pub fn open_database(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(InspectError::DatabaseNotFound(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(InspectError::NotAFile(path.to_path_buf()));
    }

    debug!(path = %path.display(), "Opening database read-only");
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    Ok(conn)
}

/// File name of `path` as shown in reports, falling back to the full path
/// when it has no final component.
pub fn database_label(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
