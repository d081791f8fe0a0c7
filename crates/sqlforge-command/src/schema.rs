//! Schema cache contract.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use sqlforge_core::{ParamType, SqlValue};

/// What the command layer needs from a table schema cache.
pub trait SchemaCache: Send + Sync {
    /// Drops whatever is cached for `table`. Called after a statement that
    /// changed the table's structure has run.
    fn refresh_table(&self, table: &str);

    /// Picks a bind type for a value whose type the caller did not give.
    fn infer_type(&self, value: &SqlValue) -> ParamType {
        ParamType::infer(value)
    }
}

#[derive(Debug, Default)]
struct SchemaState {
    columns: HashMap<String, HashMap<String, String>>,
    /// Refresh count per table, in order of first refresh.
    refreshed: IndexMap<String, u64>,
}

/// An in-memory schema cache holding column types per table.
#[derive(Debug, Default)]
pub struct MemorySchemaCache {
    state: Mutex<SchemaState>,
}

impl MemorySchemaCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the column types of `table`.
    pub fn set_column_types<K, V>(&self, table: &str, columns: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        let columns = columns
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.lock().columns.insert(String::from(table), columns);
    }

    /// Returns the cached type of a column.
    #[must_use]
    pub fn column_type(&self, table: &str, column: &str) -> Option<String> {
        self.lock()
            .columns
            .get(table)
            .and_then(|columns| columns.get(column))
            .cloned()
    }

    /// Tables refreshed so far, each once, in order of first refresh.
    #[must_use]
    pub fn refreshed_tables(&self) -> Vec<String> {
        self.lock().refreshed.keys().cloned().collect()
    }

    /// How many times `table` was refreshed.
    #[must_use]
    pub fn refresh_count(&self, table: &str) -> u64 {
        self.lock().refreshed.get(table).copied().unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, SchemaState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SchemaCache for MemorySchemaCache {
    fn refresh_table(&self, table: &str) {
        let mut state = self.lock();
        state.columns.remove(table);
        *state.refreshed.entry(String::from(table)).or_default() += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_drops_columns() {
        let cache = MemorySchemaCache::new();
        cache.set_column_types("user", [("id", "INTEGER"), ("name", "TEXT")]);
        assert_eq!(cache.column_type("user", "name").as_deref(), Some("TEXT"));

        cache.refresh_table("user");
        assert_eq!(cache.column_type("user", "name"), None);
        assert_eq!(cache.refreshed_tables(), vec!["user"]);
    }

    #[test]
    fn test_repeated_refreshes_are_counted_once_per_table() {
        let cache = MemorySchemaCache::new();
        for _ in 0..100 {
            cache.refresh_table("user");
        }
        cache.refresh_table("post");
        assert_eq!(cache.refreshed_tables(), vec!["user", "post"]);
        assert_eq!(cache.refresh_count("user"), 100);
        assert_eq!(cache.refresh_count("missing"), 0);
    }

    #[test]
    fn test_default_inference() {
        let cache = MemorySchemaCache::new();
        assert_eq!(cache.infer_type(&SqlValue::Int(1)), ParamType::Integer);
        assert_eq!(cache.infer_type(&SqlValue::Float(1.5)), ParamType::String);
        assert_eq!(cache.infer_type(&SqlValue::Null), ParamType::Null);
    }
}
