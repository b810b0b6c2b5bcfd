// tests/common/mod.rs
//! Common test utilities for the content sync integration tests.

#![allow(dead_code)]

pub mod mock_stream;
pub mod recording_cache;

use std::future::Future;
use std::time::Duration;

pub use mock_stream::MockStreamConnector;
pub use recording_cache::RecordingCache;

/// Poll `check` until it returns true or `timeout` elapses.
pub async fn wait_until<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
