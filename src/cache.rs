//! Cache collaborator.
//!
//! Invalidation only marks a resource stale; the owner of the cache decides
//! when to refetch. `MemoryCache` drops the entry so the next read misses.

use std::time::Instant;

use dashmap::DashMap;

pub trait Cache: Send + Sync {
    fn invalidate(&self, key: &str);
}

#[derive(Debug, Clone)]
struct CachedEntry {
    value: serde_json::Value,
    stored_at: Instant,
}

/// Response cache keyed by resource path.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, CachedEntry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn put(&self, key: impl Into<String>, value: serde_json::Value) {
        self.entries.insert(
            key.into(),
            CachedEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Age of the cached value, if present.
    pub fn age(&self, key: &str) -> Option<std::time::Duration> {
        self.entries.get(key).map(|entry| entry.stored_at.elapsed())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Cache for MemoryCache {
    fn invalidate(&self, key: &str) {
        if self.entries.remove(key).is_some() {
            tracing::debug!(key, "cache entry invalidated");
        }
    }
}
