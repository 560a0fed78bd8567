//! SQLite catalog introspection.
//!
//! This crate reads the schema of an existing SQLite database using the
//! engine's own introspection pragmas and produces the
//! [`sqlscope_core`] data model.
//!
//! # Architecture
//!
//! - **`quote`**: identifier quoting for statements that cannot bind names
//! - **`open`**: path validation and read-only connection opening
//! - **`inspect`**: table enumeration, schema extraction, and row counts
//!
//! # Quick start
//!
//! ```no_run
//! use sqlscope_sqlite::{Inspector, open_database};
//!
//! let conn = open_database("data/powerlog.PLSQL").unwrap();
//! let inspector = Inspector::new(&conn);
//!
//! for name in inspector.table_names().unwrap() {
//!     let schema = inspector.table_schema(&name).unwrap();
//!     println!("{name}: {} columns", schema.columns.len());
//! }
//!
//! let report = inspector.count_report("powerlog.PLSQL", 10).unwrap();
//! println!("{} of {} tables have 10+ rows", report.filtered_tables, report.total_tables);
//! ```

mod error;
mod inspect;
mod open;
mod quote;

pub use error::{InspectError, Result};
pub use inspect::Inspector;
pub use open::{database_label, open_database};
pub use quote::{quote_identifier, unquote_identifier};
