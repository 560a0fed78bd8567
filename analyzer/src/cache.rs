//! Analysis cache keyed by the content hash of the analyzed input.
//!
//! Entries live in a directory as `field_analysis_<key>.json`, where
//! `<key>` is the first 16 hex digits of the SHA-256 of the input bytes.
//! Identical input always maps to the same entry; any change to the input
//! maps to a new one, so entries never need invalidation.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::SchemaAnalyzer;
use crate::error::Result;

/// Directory created next to the schemas file when no cache directory is
/// configured.
pub const DEFAULT_CACHE_DIR_NAME: &str = ".sqlscope_cache";

const KEY_HEX_LEN: usize = 16;

/// Computes the cache key for a byte string.
///
/// # Examples
///
/// ```
/// use sqlscope_analyzer::content_key;
///
/// let key = content_key(b"{}");
/// assert_eq!(key.len(), 16);
/// assert_eq!(key, content_key(b"{}"));
/// assert_ne!(key, content_key(b"{ }"));
/// ```
pub fn content_key(bytes: &[u8]) -> String {
    let digest = format!("{:x}", Sha256::digest(bytes));
    digest[..KEY_HEX_LEN].to_string()
}

/// Directory-backed store of analysis results.
#[derive(Debug, Clone)]
pub struct AnalysisCache {
    cache_dir: PathBuf,
}

impl AnalysisCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Cache stored in [`DEFAULT_CACHE_DIR_NAME`] beside `schemas_path`.
    pub fn beside(schemas_path: impl AsRef<Path>) -> Self {
        let parent = schemas_path
            .as_ref()
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Self::new(parent.join(DEFAULT_CACHE_DIR_NAME))
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("field_analysis_{key}.json"))
    }

    /// Looks up a stored analysis.
    ///
    /// Missing, unreadable, or unparseable entries are misses, as is an
    /// entry holding an empty JSON object.
    pub fn get(&self, key: &str) -> Option<Value> {
        let path = self.entry_path(key);
        let raw = fs::read_to_string(&path).ok()?;
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) if map.is_empty() => {
                debug!(path = %path.display(), "Ignoring empty cache entry");
                None
            }
            Ok(value) => Some(value),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Ignoring corrupt cache entry");
                None
            }
        }
    }

    /// Stores an analysis, creating the cache directory if needed.
    pub fn put(&self, key: &str, analysis: &Value) -> Result<PathBuf> {
        fs::create_dir_all(&self.cache_dir)?;
        let path = self.entry_path(key);
        fs::write(&path, serde_json::to_string_pretty(analysis)?)?;
        Ok(path)
    }
}

/// Result of a cached analysis request.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub analysis: Value,
    /// `true` if the analysis was read from the cache.
    pub from_cache: bool,
    /// Entry the analysis was read from or written to.
    pub cache_path: PathBuf,
}

/// Caching decorator around any [`SchemaAnalyzer`].
///
/// With `force` set, the cache is never read but fresh results are still
/// stored.
#[derive(Debug, Clone)]
pub struct CachedAnalyzer<A> {
    inner: A,
    cache: AnalysisCache,
    force: bool,
}

impl<A: SchemaAnalyzer> CachedAnalyzer<A> {
    pub fn new(inner: A, cache: AnalysisCache) -> Self {
        Self {
            inner,
            cache,
            force: false,
        }
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn cache(&self) -> &AnalysisCache {
        &self.cache
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    /// Analyzes the JSON document in `raw`, keyed by the hash of `raw`
    /// itself.
    ///
    /// The bytes are parsed before the cache is consulted, so malformed
    /// input fails even when an entry for it exists. A failure to store
    /// the fresh result is logged and does not discard it.
    pub fn analyze_source(&self, raw: &[u8]) -> Result<AnalysisOutcome> {
        let schemas: Value = serde_json::from_slice(raw)?;
        if let Some(tables) = schemas.as_object() {
            debug!(tables = tables.len(), "Loaded table schemas");
        }

        let key = content_key(raw);
        let cache_path = self.cache.entry_path(&key);

        if self.force {
            debug!("Cache bypassed by force");
        } else if let Some(analysis) = self.cache.get(&key) {
            info!(path = %cache_path.display(), "Using cached analysis");
            return Ok(AnalysisOutcome {
                analysis,
                from_cache: true,
                cache_path,
            });
        } else {
            debug!(key = %key, "No cached analysis");
        }

        let analysis = self.inner.analyze(&schemas)?;

        match self.cache.put(&key, &analysis) {
            Ok(path) => info!(path = %path.display(), "Cached analysis"),
            Err(err) => warn!(path = %cache_path.display(), error = %err, "Failed to cache analysis"),
        }

        Ok(AnalysisOutcome {
            analysis,
            from_cache: false,
            cache_path,
        })
    }
}

impl<A: SchemaAnalyzer> SchemaAnalyzer for CachedAnalyzer<A> {
    /// Keys on the compact serialization of `schemas`.
    fn analyze(&self, schemas: &Value) -> Result<Value> {
        let raw = serde_json::to_vec(schemas)?;
        Ok(self.analyze_source(&raw)?.analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    /// Counts calls and echoes the table names it was given.
    struct CountingAnalyzer {
        calls: Cell<usize>,
    }

    impl CountingAnalyzer {
        fn new() -> Self {
            Self { calls: Cell::new(0) }
        }
    }

    impl SchemaAnalyzer for CountingAnalyzer {
        fn analyze(&self, schemas: &Value) -> Result<Value> {
            self.calls.set(self.calls.get() + 1);
            let tables: Vec<_> = schemas
                .as_object()
                .map(|m| m.keys().cloned().collect())
                .unwrap_or_default();
            Ok(json!({"tables": tables, "run": self.calls.get()}))
        }
    }

    #[test]
    fn test_content_key_matches_sha256_prefix() {
        // SHA-256("abc") = ba7816bf8f01cfea414140de5dae2223...
        assert_eq!(content_key(b"abc"), "ba7816bf8f01cfea");
    }

    #[test]
    fn test_cache_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AnalysisCache::new(dir.path().join("nested").join("cache"));

        assert!(cache.get("0123456789abcdef").is_none());
        let path = cache.put("0123456789abcdef", &json!({"summary": {}})).unwrap();
        assert!(path.ends_with("field_analysis_0123456789abcdef.json"));
        assert_eq!(cache.get("0123456789abcdef"), Some(json!({"summary": {}})));
    }

    #[test]
    fn test_cache_ignores_corrupt_and_empty_entries() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AnalysisCache::new(dir.path());

        fs::write(cache.entry_path("corrupt"), "{not json").unwrap();
        assert!(cache.get("corrupt").is_none());

        fs::write(cache.entry_path("empty"), "{}").unwrap();
        assert!(cache.get("empty").is_none());
    }

    #[test]
    fn test_cache_beside_schemas_file() {
        let cache = AnalysisCache::beside("out/schemas.json");
        assert_eq!(cache.dir(), Path::new("out/.sqlscope_cache"));

        let cache = AnalysisCache::beside("schemas.json");
        assert_eq!(cache.dir(), Path::new("./.sqlscope_cache"));
    }

    #[test]
    fn test_cached_analyzer_hits_after_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = CachedAnalyzer::new(CountingAnalyzer::new(), AnalysisCache::new(dir.path()));
        let raw = br#"{"users": {}}"#;

        let first = analyzer.analyze_source(raw).unwrap();
        assert!(!first.from_cache);
        assert_eq!(first.analysis["tables"], json!(["users"]));
        assert!(first.cache_path.exists());

        let second = analyzer.analyze_source(raw).unwrap();
        assert!(second.from_cache);
        assert_eq!(second.analysis, first.analysis);
        assert_eq!(second.cache_path, first.cache_path);
        assert_eq!(analyzer.inner().calls.get(), 1);
    }

    #[test]
    fn test_cached_analyzer_misses_on_changed_input() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = CachedAnalyzer::new(CountingAnalyzer::new(), AnalysisCache::new(dir.path()));

        analyzer.analyze_source(br#"{"users": {}}"#).unwrap();
        let changed = analyzer.analyze_source(br#"{"orders": {}}"#).unwrap();
        assert!(!changed.from_cache);
        assert_eq!(analyzer.inner().calls.get(), 2);
    }

    #[test]
    fn test_force_bypasses_cache_but_refreshes_it() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AnalysisCache::new(dir.path());
        let raw = br#"{"users": {}}"#;

        CachedAnalyzer::new(CountingAnalyzer::new(), cache.clone())
            .analyze_source(raw)
            .unwrap();

        let forced = CachedAnalyzer::new(CountingAnalyzer::new(), cache.clone()).with_force(true);
        let outcome = forced.analyze_source(raw).unwrap();
        assert!(!outcome.from_cache);
        assert_eq!(forced.inner().calls.get(), 1);
        assert_eq!(cache.get(&content_key(raw)), Some(outcome.analysis));
    }

    #[test]
    fn test_invalid_json_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AnalysisCache::new(dir.path());
        cache.put(&content_key(b"{oops"), &json!({"stale": true})).unwrap();

        let analyzer = CachedAnalyzer::new(CountingAnalyzer::new(), cache);
        let err = analyzer.analyze_source(b"{oops").unwrap_err();
        assert!(matches!(err, crate::AnalyzerError::Json(_)));
        assert_eq!(analyzer.inner().calls.get(), 0);
    }

    #[test]
    fn test_decorator_implements_trait() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = CachedAnalyzer::new(CountingAnalyzer::new(), AnalysisCache::new(dir.path()));
        let schemas = json!({"a": {}, "b": {}});

        let first = analyzer.analyze(&schemas).unwrap();
        let second = analyzer.analyze(&schemas).unwrap();
        assert_eq!(first, second);
        assert_eq!(analyzer.inner().calls.get(), 1);
    }
}
