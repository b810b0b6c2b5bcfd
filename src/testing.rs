//! In-crate fakes shared by the unit tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{Notify, Semaphore};

use crate::cache::Cache;
use crate::store::{KeyValueStore, StoreError};
use crate::telemetry::{DeliveryError, EventTransport, TelemetryEvent};

/// Transport whose outcome the test controls.
pub(crate) struct ScriptedTransport {
    delivered: Mutex<Vec<TelemetryEvent>>,
    attempts: AtomicUsize,
    fail_all: AtomicBool,
    failing_entities: Mutex<HashSet<String>>,
    failure: Mutex<DeliveryError>,
    gate: Mutex<Option<Arc<Semaphore>>>,
    entered: Notify,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self {
            delivered: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
            fail_all: AtomicBool::new(false),
            failing_entities: Mutex::new(HashSet::new()),
            failure: Mutex::new(DeliveryError::Request("connection refused".to_string())),
            gate: Mutex::new(None),
            entered: Notify::new(),
        }
    }
}

impl ScriptedTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.fail_all.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn fail_entity(&self, entity_id: &str) {
        self.failing_entities
            .lock()
            .unwrap()
            .insert(entity_id.to_string());
    }

    pub(crate) fn set_failure(&self, error: DeliveryError) {
        *self.failure.lock().unwrap() = error;
    }

    /// Block every delivery until `release` hands out permits.
    pub(crate) fn hold(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Resolves once some delivery has started.
    pub(crate) async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    pub(crate) fn delivered(&self) -> Vec<TelemetryEvent> {
        self.delivered.lock().unwrap().clone()
    }

    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventTransport for ScriptedTransport {
    async fn deliver(&self, event: &TelemetryEvent) -> Result<(), DeliveryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }

        let entity_fails = event
            .entity_id
            .as_ref()
            .is_some_and(|id| self.failing_entities.lock().unwrap().contains(id));
        if self.fail_all.load(Ordering::SeqCst) || entity_fails {
            return Err(self.failure.lock().unwrap().clone());
        }

        self.delivered.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Store whose every operation fails.
pub(crate) struct BrokenStore;

#[async_trait]
impl KeyValueStore for BrokenStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("disk detached".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("disk detached".to_string()))
    }

    async fn remove(&self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("disk detached".to_string()))
    }
}

/// Cache that remembers every invalidation in call order.
#[derive(Default)]
pub(crate) struct RecordingCache {
    keys: Mutex<Vec<String>>,
}

impl RecordingCache {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }
}

impl Cache for RecordingCache {
    fn invalidate(&self, key: &str) {
        self.keys.lock().unwrap().push(key.to_string());
    }
}
