//! Realtime cache invalidation.
//!
//! `StreamClient` keeps one push connection open for as long as its owner
//! lives, reconnecting on a fixed delay. Each message's `type` tag goes to
//! the `InvalidationRouter`, which invalidates the matching cache keys.

pub mod client;
pub mod connector;
pub mod router;
pub mod sse;


pub use client::{MessageOutcome, StreamClient, StreamState};
pub use connector::{HttpStreamConnector, MessageStream, StreamConnector, StreamError};
pub use router::{InvalidationRouter, ResourceTag, HANDSHAKE_TYPE};
pub use sse::{SseDecoder, SseEvent};
