//! Field-similarity analysis of extracted schemas.
//!
//! The analysis itself is opaque: a [`SchemaAnalyzer`] takes the schema
//! map (as written by `sqlscope schema`) and returns a JSON analysis. The
//! crate provides:
//!
//! - [`ExternalAnalyzer`]: runs an external AI command-line tool with a
//!   prompt built by [`build_prompt`] and parses its JSON envelope.
//! - [`CachedAnalyzer`]: a decorator that stores results in an
//!   [`AnalysisCache`] keyed by the SHA-256 of the input bytes.
//!
//! # Example
//!
//! ```no_run
//! use sqlscope_analyzer::{AnalysisCache, CachedAnalyzer, ExternalAnalyzer};
//!
//! let raw = std::fs::read("output/schemas.json").unwrap();
//! let analyzer = CachedAnalyzer::new(
//!     ExternalAnalyzer::default(),
//!     AnalysisCache::beside("output/schemas.json"),
//! );
//!
//! let outcome = analyzer.analyze_source(&raw).unwrap();
//! println!("cached: {}", outcome.from_cache);
//! println!("{}", serde_json::to_string_pretty(&outcome.analysis).unwrap());
//! ```

mod cache;
mod error;
mod external;
mod prompt;

pub use cache::{
    AnalysisCache, AnalysisOutcome, CachedAnalyzer, DEFAULT_CACHE_DIR_NAME, content_key,
};
pub use error::{AnalyzerError, Result};
pub use external::{
    AnalyzerConfig, DEFAULT_PROGRAM, DEFAULT_TIMEOUT_SECS, ExternalAnalyzer, parse_response,
    strip_code_fence,
};
pub use prompt::{SYSTEM_PROMPT, build_prompt};

use serde_json::Value;

/// Produces a field-similarity analysis from a schema map.
pub trait SchemaAnalyzer {
    fn analyze(&self, schemas: &Value) -> Result<Value>;
}

impl<T: SchemaAnalyzer + ?Sized> SchemaAnalyzer for &T {
    fn analyze(&self, schemas: &Value) -> Result<Value> {
        (**self).analyze(schemas)
    }
}
