//! Catalog introspection via SQLite pragmas.
//!
//! Provides [`Inspector`] for listing user tables, extracting per-table
//! schemas, and counting rows. Every operation is a stateless, read-only
//! request against the borrowed connection.
//!
//! # Example
//!
//! ```
//! use rusqlite::Connection;
//! use sqlscope_sqlite::Inspector;
//!
//! let conn = Connection::open_in_memory().unwrap();
//! conn.execute_batch(
//!     "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL);",
//! )
//! .unwrap();
//!
//! let inspector = Inspector::new(&conn);
//! assert_eq!(inspector.table_names().unwrap(), vec!["users"]);
//!
//! let schema = inspector.table_schema("users").unwrap();
//! assert_eq!(schema.columns.len(), 2);
//! assert!(schema.columns[1].not_null);
//! ```

use std::collections::BTreeMap;

use rusqlite::types::ValueRef;
use rusqlite::{Connection, Row};
use sqlscope_core::{
    ColumnInfo, DefaultValue, ForeignKeyInfo, IndexInfo, TableCountsReport, TableList,
    TableSchema,
};
use tracing::{debug, info};

use crate::error::Result;
use crate::quote::quote_identifier;

/// Prefix SQLite reserves for its own catalog tables.
const INTERNAL_TABLE_PREFIX: &str = "sqlite_";

/// Read-only introspection over a borrowed connection.
pub struct Inspector<'a> {
    conn: &'a Connection,
}

impl<'a> Inspector<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Lists user-defined tables in ascending order.
    ///
    /// Tables whose names start with `sqlite_` are engine-reserved and
    /// excluded. Views, indexes, and triggers are not tables and never
    /// appear.
    pub fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")?;

        let names: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(names
            .into_iter()
            .filter(|name| !name.starts_with(INTERNAL_TABLE_PREFIX))
            .collect())
    }

    /// [`table_names`](Self::table_names) wrapped as a [`TableList`].
    pub fn table_list(&self) -> Result<TableList> {
        Ok(TableList::new(self.table_names()?))
    }

    /// Extracts the columns, foreign keys, and indexes of one table.
    ///
    /// Each sequence keeps the order SQLite returns. A table that does not
    /// exist produces empty sequences rather than an error.
    pub fn table_schema(&self, table_name: &str) -> Result<TableSchema> {
        let quoted = quote_identifier(table_name);
        debug!(table = %table_name, "Extracting table schema");

        let columns = self.pragma_rows(&format!("PRAGMA table_info({quoted})"), column_from_row)?;
        let foreign_keys = self.pragma_rows(
            &format!("PRAGMA foreign_key_list({quoted})"),
            foreign_key_from_row,
        )?;
        let indexes = self.pragma_rows(&format!("PRAGMA index_list({quoted})"), index_from_row)?;

        Ok(TableSchema::new(table_name, columns, foreign_keys, indexes))
    }

    /// Extracts schemas for each named table, keyed by table name.
    ///
    /// Stops at the first database error.
    pub fn table_schemas<S: AsRef<str>>(
        &self,
        table_names: &[S],
    ) -> Result<BTreeMap<String, TableSchema>> {
        let mut schemas = BTreeMap::new();
        for name in table_names {
            let name = name.as_ref();
            info!(table = %name, "Extracting schema");
            schemas.insert(name.to_string(), self.table_schema(name)?);
        }
        Ok(schemas)
    }

    /// Counts rows in one table.
    pub fn row_count(&self, table_name: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(table_name));
        let count = self.conn.query_row(&sql, [], |row| row.get::<_, i64>(0))?;
        Ok(count)
    }

    /// Counts rows in each named table, keeping tables with at least
    /// `min_rows` rows.
    ///
    /// Tables are counted in input order with one query each. The first
    /// failure aborts the remaining counts.
    pub fn table_counts<S: AsRef<str>>(
        &self,
        table_names: &[S],
        min_rows: i64,
    ) -> Result<BTreeMap<String, i64>> {
        let mut counts = BTreeMap::new();
        for name in table_names {
            let name = name.as_ref();
            let count = self.row_count(name)?;
            debug!(table = %name, count, "Counted rows");
            if count >= min_rows {
                counts.insert(name.to_string(), count);
            }
        }
        Ok(counts)
    }

    /// Enumerates all user tables, counts them, and builds the report
    /// document labelled with `database`.
    pub fn count_report(&self, database: &str, min_rows: i64) -> Result<TableCountsReport> {
        let names = self.table_names()?;
        let counts = self.table_counts(&names, min_rows)?;
        Ok(TableCountsReport::new(database, names.len(), min_rows, counts))
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        self.conn
    }

    fn pragma_rows<T>(
        &self,
        sql: &str,
        map: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map([], map)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

/// Maps a `PRAGMA table_info` row: `cid, name, type, notnull, dflt_value, pk`.
fn column_from_row(row: &Row<'_>) -> rusqlite::Result<ColumnInfo> {
    Ok(ColumnInfo {
        cid: row.get(0)?,
        name: row.get(1)?,
        column_type: row.get(2)?,
        not_null: row.get::<_, i64>(3)? != 0,
        default_value: default_value(row.get_ref(4)?),
        // pk is the 1-based position within the primary key, 0 otherwise.
        primary_key: row.get::<_, i64>(5)? != 0,
    })
}

/// Maps a `PRAGMA foreign_key_list` row:
/// `id, seq, table, from, to, on_update, on_delete, match`.
fn foreign_key_from_row(row: &Row<'_>) -> rusqlite::Result<ForeignKeyInfo> {
    Ok(ForeignKeyInfo {
        id: row.get(0)?,
        seq: row.get(1)?,
        table: row.get(2)?,
        from_column: row.get(3)?,
        to_column: row.get(4)?,
        on_update: row.get(5)?,
        on_delete: row.get(6)?,
        match_policy: row.get(7)?,
    })
}

/// Maps a `PRAGMA index_list` row: `seq, name, unique, origin, partial`.
fn index_from_row(row: &Row<'_>) -> rusqlite::Result<IndexInfo> {
    Ok(IndexInfo {
        name: row.get(1)?,
        unique: row.get::<_, i64>(2)? != 0,
        origin: row.get(3)?,
        partial: row.get::<_, i64>(4)? != 0,
    })
}

fn default_value(value: ValueRef<'_>) -> DefaultValue {
    match value {
        ValueRef::Null => DefaultValue::Null,
        ValueRef::Integer(i) => DefaultValue::Integer(i),
        ValueRef::Real(f) => DefaultValue::Real(f),
        ValueRef::Text(bytes) => DefaultValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => DefaultValue::Blob(bytes.to_vec()),
    }
}
