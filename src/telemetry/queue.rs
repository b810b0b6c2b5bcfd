//! Size-bounded durable queue of undelivered telemetry events.
//!
//! The whole queue lives as one JSON array under [`EVENT_QUEUE_KEY`]. Every
//! read-modify-write runs under `write_lock`, so an append racing a drain's
//! write-back can't be lost: the drain re-reads the stored array and removes
//! only the entries it delivered.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::event::{QueuedEvent, TelemetryEvent};
use crate::store::{KeyValueStore, StoreError, EVENT_QUEUE_KEY};

pub const DEFAULT_QUEUE_CAPACITY: usize = crate::config::DEFAULT_QUEUE_CAPACITY;

pub struct DurableQueue {
    store: Arc<dyn KeyValueStore>,
    capacity: usize,
    write_lock: Mutex<()>,
}

impl DurableQueue {
    pub fn new(store: Arc<dyn KeyValueStore>, capacity: usize) -> Self {
        Self {
            store,
            capacity: capacity.max(1),
            write_lock: Mutex::new(()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append an event, evicting the oldest entries beyond capacity. Fails
    /// when the store did not persist the updated queue.
    pub async fn push(&self, event: TelemetryEvent) -> Result<QueuedEvent, StoreError> {
        let entry = QueuedEvent {
            queue_id: Uuid::new_v4().to_string(),
            queued_at: Utc::now().to_rfc3339(),
            event,
        };

        let _guard = self.write_lock.lock().await;
        let mut entries = self.read().await;
        entries.push(entry.clone());

        if entries.len() > self.capacity {
            let excess = entries.len() - self.capacity;
            entries.drain(..excess);
            tracing::warn!(
                evicted = excess,
                capacity = self.capacity,
                "telemetry queue full, dropped oldest events"
            );
        }

        self.write(&entries).await?;
        Ok(entry)
    }

    /// Point-in-time copy of the queue in enqueue order.
    pub async fn snapshot(&self) -> Vec<QueuedEvent> {
        let _guard = self.write_lock.lock().await;
        self.read().await
    }

    /// Remove the given entries from the current stored queue, keeping
    /// anything appended since they were read. Returns how many were removed.
    pub async fn remove(&self, queue_ids: &HashSet<String>) -> usize {
        if queue_ids.is_empty() {
            return 0;
        }

        let _guard = self.write_lock.lock().await;
        let mut entries = self.read().await;
        let before = entries.len();
        entries.retain(|entry| !queue_ids.contains(&entry.queue_id));
        let removed = before - entries.len();

        if removed > 0 {
            if let Err(e) = self.write(&entries).await {
                tracing::warn!("failed to persist telemetry queue: {e}");
            }
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.snapshot().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn read(&self) -> Vec<QueuedEvent> {
        let raw = match self.store.get(EVENT_QUEUE_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("failed to read telemetry queue, treating as empty: {e}");
                return Vec::new();
            }
        };

        let values: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(values) => values,
            Err(e) => {
                tracing::warn!("discarding unreadable telemetry queue: {e}");
                return Vec::new();
            }
        };

        // One entry this build can't decode must not cost the others.
        values
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<QueuedEvent>(value) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("dropping unreadable telemetry queue entry: {e}");
                    None
                }
            })
            .collect()
    }

    async fn write(&self, entries: &[QueuedEvent]) -> Result<(), StoreError> {
        if entries.is_empty() {
            return self.store.remove(EVENT_QUEUE_KEY).await;
        }
        let raw = serde_json::to_string(entries)
            .map_err(|e| StoreError::Backend(format!("failed to serialize telemetry queue: {e}")))?;
        self.store.set(EVENT_QUEUE_KEY, &raw).await
    }
}
