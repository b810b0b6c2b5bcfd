//! Top-level wiring for one owning UI lifetime.

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::cache::Cache;
use crate::config::SyncConfig;
use crate::realtime::{HttpStreamConnector, InvalidationRouter, StreamClient, StreamConnector, StreamState};
use crate::store::KeyValueStore;
use crate::telemetry::{
    DrainOutcome, DrainTrigger, DurableQueue, EventDescriptor, EventSender, EventTransport,
    HttpEventTransport, QueueDrainer, SessionIdentity,
};
use crate::SyncError;

pub struct ContentSync {
    config: SyncConfig,
    identity: Arc<SessionIdentity>,
    queue: Arc<DurableQueue>,
    sender: Arc<EventSender>,
    drainer: Arc<QueueDrainer>,
    trigger: DrainTrigger,
    stream: StreamClient,
    shutdown: CancellationToken,
    drain_task: Mutex<Option<JoinHandle<()>>>,
}

impl ContentSync {
    /// Wire the HTTP stream connector and event transport from `config`.
    pub fn new(
        config: SyncConfig,
        store: Arc<dyn KeyValueStore>,
        cache: Arc<dyn Cache>,
    ) -> Result<Self, SyncError> {
        config.validate()?;
        let transport = Arc::new(HttpEventTransport::new(&config)?);
        let connector = Arc::new(HttpStreamConnector::new(&config)?);
        Ok(Self::with_parts(config, store, cache, transport, connector))
    }

    pub fn with_parts(
        config: SyncConfig,
        store: Arc<dyn KeyValueStore>,
        cache: Arc<dyn Cache>,
        transport: Arc<dyn EventTransport>,
        connector: Arc<dyn StreamConnector>,
    ) -> Self {
        let identity = Arc::new(SessionIdentity::new(store.clone()));
        let queue = Arc::new(DurableQueue::new(store, config.queue_capacity));
        let trigger = DrainTrigger::new();

        let sender = EventSender::new(
            identity.clone(),
            queue.clone(),
            transport.clone(),
            config.source.clone(),
        )
        .with_discard_rejected(config.discard_rejected)
        .with_drain_trigger(trigger.clone());

        let drainer = QueueDrainer::new(queue.clone(), transport)
            .with_discard_rejected(config.discard_rejected);

        let stream = StreamClient::new(
            connector,
            InvalidationRouter::new(cache),
            config.reconnect_delay(),
        );

        Self {
            config,
            identity,
            queue,
            sender: Arc::new(sender),
            drainer: Arc::new(drainer),
            trigger,
            stream,
            shutdown: CancellationToken::new(),
            drain_task: Mutex::new(None),
        }
    }

    /// Open the push stream and start the drain schedule. Must run inside a
    /// tokio runtime. Repeated calls are no-ops.
    pub fn start(&self) {
        self.stream.start();

        let mut drain_task = self.drain_task.lock().expect("drain task mutex poisoned");
        if drain_task.is_none() && !self.shutdown.is_cancelled() {
            *drain_task = Some(self.drainer.spawn(
                self.config.drain_interval(),
                self.trigger.clone(),
                self.shutdown.clone(),
            ));
        }
    }

    /// Tear everything down. Nothing reconnects or drains afterwards.
    pub fn stop(&self) {
        self.stream.stop();
        self.shutdown.cancel();
        if let Some(task) = self
            .drain_task
            .lock()
            .expect("drain task mutex poisoned")
            .take()
        {
            task.abort();
        }
    }

    /// Record an interaction without waiting on the network.
    pub fn track(&self, descriptor: EventDescriptor) {
        let sender = self.sender.clone();
        tokio::spawn(async move {
            sender.send(descriptor).await;
        });
    }

    /// Record an interaction, returning once the attempt (or queueing) is done.
    pub async fn send(&self, descriptor: EventDescriptor) {
        self.sender.send(descriptor).await;
    }

    pub async fn drain_now(&self) -> DrainOutcome {
        self.drainer.drain().await
    }

    pub fn stream_state(&self) -> StreamState {
        self.stream.state()
    }

    pub fn stream(&self) -> &StreamClient {
        &self.stream
    }

    pub async fn pending_events(&self) -> usize {
        self.queue.len().await
    }

    pub async fn session_id(&self) -> String {
        self.identity.session_id().await
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }
}

impl Drop for ContentSync {
    fn drop(&mut self) {
        self.shutdown.cancel();
        if let Ok(mut task) = self.drain_task.lock() {
            if let Some(task) = task.take() {
                task.abort();
            }
        }
    }
}
