//! Core types for SQLite schema introspection output.
//!
//! This crate defines the data model emitted by the `sqlscope` tools:
//!
//! - [`TableSchema`]: one table's columns, foreign keys, and indexes.
//! - [`ColumnInfo`]: a row of `PRAGMA table_info`.
//! - [`ForeignKeyInfo`]: a row of `PRAGMA foreign_key_list`.
//! - [`IndexInfo`]: a row of `PRAGMA index_list`.
//! - [`DefaultValue`]: a column's declared default, typed by SQLite storage class.
//! - [`TableList`] and [`TableCountsReport`]: the table-list and row-count
//!   documents.
//!
//! Field names serialize exactly as the JSON documents expect, so the
//! types can be written with `serde_json` directly.
//!
//! # Example
//!
//! ```
//! use sqlscope_core::*;
//!
//! let schema = TableSchema::new(
//!     "users",
//!     vec![ColumnInfo {
//!         cid: 0,
//!         name: "id".into(),
//!         column_type: "INTEGER".into(),
//!         not_null: false,
//!         default_value: DefaultValue::Null,
//!         primary_key: true,
//!     }],
//!     Vec::new(),
//!     Vec::new(),
//! );
//!
//! assert_eq!(schema.primary_key_columns().count(), 1);
//! assert!(!schema.is_empty());
//! ```

mod report;
mod types;

pub use report::{TableCountsReport, TableList};
pub use types::*;
