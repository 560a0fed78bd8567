//! Table schema types.
//!
//! Each record is an immutable snapshot of one row returned by a SQLite
//! introspection pragma. [`TableSchema`] owns the three ordered sequences
//! for one table; the order is exactly the pragma row order.

use serde::{Deserialize, Serialize};

/// Declared default value of a column.
///
/// SQLite reports `dflt_value` with whatever storage class the catalog
/// holds, so the value is modeled as a sum over the five storage classes.
/// Serializes untagged: `null`, a JSON number, a JSON string, or an array
/// of byte values.
///
/// # Examples
///
/// ```
/// use sqlscope_core::DefaultValue;
///
/// let value = DefaultValue::Text("'active'".into());
/// assert_eq!(serde_json::to_string(&value).unwrap(), r#""'active'""#);
/// assert_eq!(serde_json::to_string(&DefaultValue::Null).unwrap(), "null");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum DefaultValue {
    /// No default declared.
    #[default]
    Null,
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit IEEE float.
    Real(f64),
    /// Text, usually the SQL source of the default expression.
    Text(String),
    /// Raw bytes.
    Blob(Vec<u8>),
}

impl DefaultValue {
    /// Returns `true` when no default is declared.
    pub fn is_null(&self) -> bool {
        matches!(self, DefaultValue::Null)
    }
}

/// One column, as reported by `PRAGMA table_info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Zero-based position in declaration order.
    pub cid: i64,
    pub name: String,
    /// Declared type string, empty when the column has no declared type.
    #[serde(rename = "type")]
    pub column_type: String,
    pub not_null: bool,
    pub default_value: DefaultValue,
    /// Whether the column is part of the primary key.
    pub primary_key: bool,
}

/// One foreign-key column mapping, as reported by `PRAGMA foreign_key_list`.
///
/// Composite keys produce several records sharing an `id`, distinguished
/// by `seq`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyInfo {
    pub id: i64,
    pub seq: i64,
    /// Referenced (parent) table.
    pub table: String,
    pub from_column: String,
    /// Referenced column. `None` when the constraint names only the parent
    /// table and implicitly targets its primary key.
    pub to_column: Option<String>,
    pub on_update: String,
    pub on_delete: String,
    #[serde(rename = "match")]
    pub match_policy: String,
}

/// One index, as reported by `PRAGMA index_list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexInfo {
    pub name: String,
    pub unique: bool,
    /// `c` for `CREATE INDEX`, `u` for a `UNIQUE` constraint, `pk` for a
    /// `PRIMARY KEY` constraint.
    pub origin: String,
    pub partial: bool,
}

/// Complete schema information for one table.
///
/// Built once from three introspection reads and never mutated afterward.
/// A table that does not exist in the catalog yields an empty schema
/// rather than an error; see [`is_empty`](TableSchema::is_empty).
///
/// # Examples
///
/// ```
/// use sqlscope_core::TableSchema;
///
/// let schema = TableSchema::new("missing", Vec::new(), Vec::new(), Vec::new());
/// assert!(schema.is_empty());
/// assert_eq!(schema.table_name, "missing");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub table_name: String,
    pub columns: Vec<ColumnInfo>,
    pub foreign_keys: Vec<ForeignKeyInfo>,
    pub indexes: Vec<IndexInfo>,
}

impl TableSchema {
    /// Wraps the three ordered sequences into one record.
    pub fn new(
        table_name: impl Into<String>,
        columns: Vec<ColumnInfo>,
        foreign_keys: Vec<ForeignKeyInfo>,
        indexes: Vec<IndexInfo>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            columns,
            foreign_keys,
            indexes,
        }
    }

    /// Returns `true` when all three sequences are empty, which is what
    /// introspecting a nonexistent table produces.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.foreign_keys.is_empty() && self.indexes.is_empty()
    }

    /// Looks up a column by exact name.
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Columns that participate in the primary key, in declaration order.
    pub fn primary_key_columns(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.columns.iter().filter(|c| c.primary_key)
    }

    /// Foreign keys whose parent is `table`.
    pub fn foreign_keys_to<'a>(
        &'a self,
        table: &'a str,
    ) -> impl Iterator<Item = &'a ForeignKeyInfo> + 'a {
        self.foreign_keys.iter().filter(move |fk| fk.table == table)
    }
}
