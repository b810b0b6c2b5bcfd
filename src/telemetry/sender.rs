use std::sync::Arc;

use super::drainer::DrainTrigger;
use super::event::{EventDescriptor, TelemetryEvent};
use super::identity::SessionIdentity;
use super::queue::DurableQueue;
use super::transport::{DeliveryError, EventTransport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered,
    /// Delivery failed; the event is waiting in the durable queue.
    Queued { queue_id: String },
    /// The server rejected the payload and rejections are configured to drop.
    Discarded,
    /// Delivery failed and the store refused the queued copy.
    Lost,
}

pub struct EventSender {
    identity: Arc<SessionIdentity>,
    queue: Arc<DurableQueue>,
    transport: Arc<dyn EventTransport>,
    source: String,
    discard_rejected: bool,
    drain_trigger: Option<DrainTrigger>,
}

impl EventSender {
    pub fn new(
        identity: Arc<SessionIdentity>,
        queue: Arc<DurableQueue>,
        transport: Arc<dyn EventTransport>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            identity,
            queue,
            transport,
            source: source.into(),
            discard_rejected: false,
            drain_trigger: None,
        }
    }

    pub fn with_discard_rejected(mut self, discard_rejected: bool) -> Self {
        self.discard_rejected = discard_rejected;
        self
    }

    /// Ask a drainer to run whenever an event lands in the queue.
    pub fn with_drain_trigger(mut self, trigger: DrainTrigger) -> Self {
        self.drain_trigger = Some(trigger);
        self
    }

    /// Fire-and-forget delivery. Failures are absorbed.
    pub async fn send(&self, descriptor: EventDescriptor) {
        let event_type = descriptor.event_type;
        let outcome = self.try_send(descriptor).await;
        tracing::debug!(%event_type, ?outcome, "telemetry event handled");
    }

    /// Resolve identity, attempt delivery once, and queue on failure.
    pub async fn try_send(&self, descriptor: EventDescriptor) -> SendOutcome {
        let event = self.resolve(descriptor).await;

        match self.transport.deliver(&event).await {
            Ok(()) => SendOutcome::Delivered,
            Err(error) => self.on_failure(event, error).await,
        }
    }

    async fn resolve(&self, descriptor: EventDescriptor) -> TelemetryEvent {
        let session_id = self.identity.session_id().await;
        let user_id = self.identity.user_id().await;
        TelemetryEvent::resolve(descriptor, session_id, user_id, &self.source)
    }

    async fn on_failure(&self, event: TelemetryEvent, error: DeliveryError) -> SendOutcome {
        if self.discard_rejected && !error.is_retryable() {
            tracing::warn!(
                event_type = %event.event_type,
                "telemetry event rejected, not queueing: {error}"
            );
            return SendOutcome::Discarded;
        }

        tracing::debug!(
            event_type = %event.event_type,
            "telemetry delivery failed, queueing: {error}"
        );
        let event_type = event.event_type;
        match self.queue.push(event).await {
            Ok(entry) => {
                if let Some(trigger) = &self.drain_trigger {
                    trigger.request();
                }
                SendOutcome::Queued {
                    queue_id: entry.queue_id,
                }
            }
            Err(e) => {
                tracing::warn!(%event_type, "telemetry event lost, queue write failed: {e}");
                SendOutcome::Lost
            }
        }
    }
}
