//! Content sync core.
//!
//! Keeps a content client's cache fresh and its analytics flowing over a
//! flaky network:
//! - `realtime`: push-stream client that invalidates cached resources
//! - `telemetry`: fire-and-forget event sender backed by a durable queue
//! - `store` / `db`: key-value persistence (in-memory and SQLite)
//! - `cache`: the cache collaborator the stream invalidates
//! - `sync`: `ContentSync`, wiring all of the above for one UI lifetime
//!
//! Nothing here surfaces errors to the UI. Failures are retried later or
//! absorbed, and logged through `tracing`.

pub mod cache;
pub mod config;
pub mod db;
pub mod realtime;
pub mod store;
pub mod sync;
pub mod telemetry;

#[cfg(test)]
mod testing;

pub use cache::{Cache, MemoryCache};
pub use config::SyncConfig;
pub use db::SqliteStore;
pub use store::{KeyValueStore, MemoryStore};
pub use sync::ContentSync;

// ---------------------------------------------------------------------------
// Shared error type
// ---------------------------------------------------------------------------

/// Construction-time failures. Runtime failures never reach callers.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("{0}")]
    Config(#[from] config::ConfigError),
    #[error("{0}")]
    Db(#[from] db::DbError),
    #[error("{0}")]
    Delivery(#[from] telemetry::DeliveryError),
    #[error("{0}")]
    Stream(#[from] realtime::StreamError),
}

/// Install the global `tracing` subscriber, honouring `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "contentsync=debug,info".parse().expect("valid env filter")),
        )
        .try_init();
}
