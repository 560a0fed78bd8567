use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The table-list document: `{"tables": [...]}`.
///
/// # Examples
///
/// ```
/// use sqlscope_core::TableList;
///
/// let list = TableList::new(vec!["orders".into(), "users".into()]);
/// assert_eq!(list.len(), 2);
/// assert_eq!(
///     serde_json::to_string(&list).unwrap(),
///     r#"{"tables":["orders","users"]}"#
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableList {
    pub tables: Vec<String>,
}

impl TableList {
    pub fn new(tables: Vec<String>) -> Self {
        Self { tables }
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables.iter().any(|t| t == table)
    }
}

/// Row counts for the tables of one database.
///
/// `filtered_tables` is always the number of entries in `table_counts`;
/// [`new`](TableCountsReport::new) derives it so the two cannot disagree.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use sqlscope_core::TableCountsReport;
///
/// let mut counts = BTreeMap::new();
/// counts.insert("users".to_string(), 12);
///
/// let report = TableCountsReport::new("app.db", 2, 10, counts);
/// assert_eq!(report.total_tables, 2);
/// assert_eq!(report.filtered_tables, 1);
/// assert_eq!(report.count("users"), Some(12));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCountsReport {
    /// File name of the database that was counted.
    pub database: String,
    /// Number of user tables in the database before filtering.
    pub total_tables: usize,
    /// Number of tables that met the threshold.
    pub filtered_tables: usize,
    /// Minimum row count a table needed to be included.
    pub min_rows_filter: i64,
    pub table_counts: BTreeMap<String, i64>,
}

impl TableCountsReport {
    pub fn new(
        database: impl Into<String>,
        total_tables: usize,
        min_rows_filter: i64,
        table_counts: BTreeMap<String, i64>,
    ) -> Self {
        Self {
            database: database.into(),
            total_tables,
            filtered_tables: table_counts.len(),
            min_rows_filter,
            table_counts,
        }
    }

    /// Row count of `table`, if it passed the filter.
    pub fn count(&self, table: &str) -> Option<i64> {
        self.table_counts.get(table).copied()
    }

    /// Sum of all included row counts.
    pub fn total_rows(&self) -> i64 {
        self.table_counts.values().sum()
    }
}
