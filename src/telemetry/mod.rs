//! Reliable telemetry delivery.
//!
//! Events flow UI → `EventSender` → ingestion endpoint. A failed attempt
//! parks the fully resolved event in the `DurableQueue`; the `QueueDrainer`
//! replays it later, on a schedule or when the sender asks.
//!
//! Identity (`sessionId`, `userId`) is frozen when the sender resolves the
//! event, so a drained event keeps the ids it had on its first attempt.

pub mod drainer;
pub mod event;
pub mod identity;
pub mod queue;
pub mod sender;
pub mod transport;


pub use drainer::{DrainOutcome, DrainTrigger, QueueDrainer};
pub use event::{EventDescriptor, EventType, QueuedEvent, TelemetryEvent};
pub use identity::SessionIdentity;
pub use queue::DurableQueue;
pub use sender::{EventSender, SendOutcome};
pub use transport::{DeliveryError, EventTransport, HttpEventTransport};
