//! Query result cache contract and an in-memory implementation.

use std::fmt;
use std::time::{Duration, Instant};

use moka::sync::Cache;
use moka::Expiry;
use tracing::warn;

use crate::mode::{QueryMode, QueryResult};

/// Identifies one cached result.
///
/// The SQL is the raw form with parameters inlined, so two commands with
/// the same text and values share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Connection DSN.
    pub dsn: String,
    /// SQL with parameters substituted.
    pub raw_sql: String,
    /// Result shape.
    pub mode: QueryMode,
}

impl CacheKey {
    /// Creates a key.
    pub fn new(dsn: impl Into<String>, raw_sql: impl Into<String>, mode: QueryMode) -> Self {
        Self {
            dsn: dsn.into(),
            raw_sql: raw_sql.into(),
            mode,
        }
    }
}

/// Shared storage for shaped query results.
pub trait QueryCache: Send + Sync {
    /// Returns a live entry.
    fn get(&self, key: &CacheKey) -> Option<QueryResult>;

    /// Stores an entry. `ttl` of `None` keeps it until invalidated;
    /// `dependency` tags it for [`QueryCache::invalidate`].
    fn set(
        &self,
        key: CacheKey,
        value: QueryResult,
        ttl: Option<Duration>,
        dependency: Option<&str>,
    );

    /// Drops every entry tagged with `dependency`.
    fn invalidate(&self, dependency: &str);
}

/// Entry count a [`MemoryQueryCache`] holds before evicting.
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

#[derive(Debug, Clone)]
struct Entry {
    value: QueryResult,
    ttl: Option<Duration>,
    dependency: Option<String>,
}

/// Expires each entry after its own TTL.
struct EntryExpiry;

impl Expiry<CacheKey, Entry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &CacheKey,
        entry: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        entry.ttl
    }

    fn expire_after_update(
        &self,
        _key: &CacheKey,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        entry.ttl
    }
}

/// A process-local [`QueryCache`] backed by `moka`.
///
/// Entries expire after their own TTL and the least useful ones are
/// evicted once the capacity is reached.
#[derive(Clone)]
pub struct MemoryQueryCache {
    entries: Cache<CacheKey, Entry>,
}

impl MemoryQueryCache {
    /// Creates an empty cache holding up to [`DEFAULT_CACHE_CAPACITY`]
    /// entries.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// Creates an empty cache holding up to `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: u64) -> Self {
        let entries = Cache::builder()
            .name("sqlforge-query-cache")
            .max_capacity(capacity)
            .expire_after(EntryExpiry)
            .support_invalidation_closures()
            .build();
        Self { entries }
    }

    /// Number of live entries, after pending evictions are applied.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.run_pending_tasks();
        usize::try_from(self.entries.entry_count()).unwrap_or(usize::MAX)
    }

    /// Returns whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryQueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryQueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryQueryCache")
            .field("entry_count", &self.entries.entry_count())
            .finish_non_exhaustive()
    }
}

impl QueryCache for MemoryQueryCache {
    fn get(&self, key: &CacheKey) -> Option<QueryResult> {
        self.entries.get(key).map(|entry| entry.value)
    }

    fn set(
        &self,
        key: CacheKey,
        value: QueryResult,
        ttl: Option<Duration>,
        dependency: Option<&str>,
    ) {
        if ttl.is_some_and(|ttl| ttl.is_zero()) {
            self.entries.invalidate(&key);
            return;
        }
        let entry = Entry {
            value,
            ttl,
            dependency: dependency.map(String::from),
        };
        self.entries.insert(key, entry);
    }

    fn invalidate(&self, dependency: &str) {
        let dependency = String::from(dependency);
        let result = self
            .entries
            .invalidate_entries_if(move |_, entry| entry.dependency.as_deref() == Some(&*dependency));
        if let Err(error) = result {
            warn!(target: "sqlforge::command", error = %error, "query cache invalidation failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use sqlforge_core::SqlValue;

    use super::*;

    fn key(sql: &str) -> CacheKey {
        CacheKey::new("sqlite::memory:", sql, QueryMode::Scalar)
    }

    fn scalar(n: i64) -> QueryResult {
        QueryResult::Scalar(Some(SqlValue::Int(n)))
    }

    #[test]
    fn test_get_set() {
        let cache = MemoryQueryCache::new();
        assert_eq!(cache.get(&key("SELECT 1")), None);
        cache.set(key("SELECT 1"), scalar(1), None, None);
        assert_eq!(cache.get(&key("SELECT 1")), Some(scalar(1)));
        assert_eq!(
            cache.get(&CacheKey::new("sqlite::memory:", "SELECT 1", QueryMode::All)),
            None
        );
    }

    #[test]
    fn test_zero_ttl_expires() {
        let cache = MemoryQueryCache::new();
        cache.set(key("SELECT 1"), scalar(1), Some(Duration::ZERO), None);
        assert_eq!(cache.get(&key("SELECT 1")), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_by_dependency() {
        let cache = MemoryQueryCache::new();
        cache.set(key("SELECT 1"), scalar(1), None, Some("user"));
        cache.set(key("SELECT 2"), scalar(2), None, Some("post"));
        cache.invalidate("user");
        assert_eq!(cache.get(&key("SELECT 1")), None);
        assert_eq!(cache.get(&key("SELECT 2")), Some(scalar(2)));
    }

    #[test]
    fn test_expired_sets_are_not_kept() {
        let cache = MemoryQueryCache::new();
        for n in 0..1000 {
            cache.set(key(&format!("SELECT {n}")), scalar(n), Some(Duration::ZERO), None);
        }
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_capacity_bounds_entries() {
        let cache = MemoryQueryCache::with_capacity(50);
        for n in 0..1000 {
            cache.set(key(&format!("SELECT {n}")), scalar(n), None, None);
        }
        assert!(cache.len() <= 50);
    }

    #[test]
    fn test_set_replaces_ttl() {
        let cache = MemoryQueryCache::new();
        cache.set(key("SELECT 1"), scalar(1), None, None);
        cache.set(key("SELECT 1"), scalar(2), Some(Duration::ZERO), None);
        assert_eq!(cache.get(&key("SELECT 1")), None);
    }
}
