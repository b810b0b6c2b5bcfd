//! Persistent key-value store abstraction.
//!
//! The sync core never owns storage. It talks to a `KeyValueStore` that
//! holds opaque string blobs (JSON in practice) under well-known keys:
//! the session id, the durable telemetry queue, and the auth record.

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;

/// Key holding the memoized per-install session id.
pub const SESSION_ID_KEY: &str = "contentsync.session_id";
/// Key holding the serialized durable telemetry queue.
pub const EVENT_QUEUE_KEY: &str = "contentsync.event_queue";
/// Key of the authenticated-user record written by the auth layer.
pub const AUTH_USER_KEY: &str = "auth.user";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Volatile store backed by a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}
