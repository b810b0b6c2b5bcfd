use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::queue::DurableQueue;
use super::transport::EventTransport;

/// Cloneable handle that wakes a running drain schedule.
#[derive(Clone, Default)]
pub struct DrainTrigger {
    notify: Arc<Notify>,
}

impl DrainTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a drain. Requests made while no schedule is waiting coalesce
    /// into one.
    pub fn request(&self) {
        self.notify.notify_one();
    }

    pub(crate) async fn notified(&self) {
        self.notify.notified().await;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Another drain held the lock; nothing was attempted.
    Busy,
    Empty,
    Completed {
        delivered: usize,
        dropped: usize,
        remaining: usize,
    },
}

pub struct QueueDrainer {
    queue: Arc<DurableQueue>,
    transport: Arc<dyn EventTransport>,
    in_flight: Mutex<()>,
    discard_rejected: bool,
}

impl QueueDrainer {
    pub fn new(queue: Arc<DurableQueue>, transport: Arc<dyn EventTransport>) -> Self {
        Self {
            queue,
            transport,
            in_flight: Mutex::new(()),
            discard_rejected: false,
        }
    }

    pub fn with_discard_rejected(mut self, discard_rejected: bool) -> Self {
        self.discard_rejected = discard_rejected;
        self
    }

    /// One pass over a snapshot of the queue. Each entry gets exactly one
    /// attempt; only delivered (or discarded) entries are removed.
    pub async fn drain(&self) -> DrainOutcome {
        let Ok(_guard) = self.in_flight.try_lock() else {
            tracing::debug!("telemetry drain already in flight, skipping");
            return DrainOutcome::Busy;
        };

        let entries = self.queue.snapshot().await;
        if entries.is_empty() {
            return DrainOutcome::Empty;
        }

        let mut finished = HashSet::new();
        let mut delivered = 0;
        let mut dropped = 0;

        for entry in &entries {
            match self.transport.deliver(&entry.event).await {
                Ok(()) => {
                    delivered += 1;
                    finished.insert(entry.queue_id.clone());
                }
                Err(error) if self.discard_rejected && !error.is_retryable() => {
                    tracing::warn!(
                        queue_id = %entry.queue_id,
                        "dropping rejected telemetry event: {error}"
                    );
                    dropped += 1;
                    finished.insert(entry.queue_id.clone());
                }
                Err(error) => {
                    tracing::debug!(
                        queue_id = %entry.queue_id,
                        "queued telemetry event still undeliverable: {error}"
                    );
                }
            }
        }

        self.queue.remove(&finished).await;
        let remaining = entries.len() - finished.len();

        tracing::info!(delivered, dropped, remaining, "telemetry queue drained");
        DrainOutcome::Completed {
            delivered,
            dropped,
            remaining,
        }
    }

    /// Drain on every tick of `interval` and on every trigger until cancelled.
    /// The first tick fires immediately, replaying whatever a previous process
    /// left behind.
    pub async fn run(
        self: Arc<Self>,
        interval: Duration,
        trigger: DrainTrigger,
        cancel: CancellationToken,
    ) {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
                _ = trigger.notified() => {}
            }
            self.drain().await;
        }

        tracing::debug!("telemetry drain schedule stopped");
    }

    pub fn spawn(
        self: &Arc<Self>,
        interval: Duration,
        trigger: DrainTrigger,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(Arc::clone(self).run(interval, trigger, cancel))
    }
}
