// tests/common/mock_stream.rs
//! Push-stream connector driven by the test.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use futures::channel::mpsc;

use contentsync::realtime::{MessageStream, StreamConnector, StreamError};

pub type ServerHandle = mpsc::UnboundedSender<Result<String, StreamError>>;

/// Every `connect` opens a fresh channel; the latest sender plays the server.
#[derive(Default)]
pub struct MockStreamConnector {
    server: Mutex<Option<ServerHandle>>,
    refuse: Mutex<bool>,
    connects: AtomicUsize,
}

impl MockStreamConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_refuse(&self, refuse: bool) {
        *self.refuse.lock().unwrap() = refuse;
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Push a raw message on the current connection.
    pub fn push(&self, text: &str) -> bool {
        match self.server.lock().unwrap().as_ref() {
            Some(server) => server.unbounded_send(Ok(text.to_string())).is_ok(),
            None => false,
        }
    }

    /// Close the current connection from the server side.
    pub fn hang_up(&self) {
        self.server.lock().unwrap().take();
    }

    pub fn is_open(&self) -> bool {
        self.server
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|server| !server.is_closed())
    }
}

#[async_trait]
impl StreamConnector for MockStreamConnector {
    async fn connect(&self) -> Result<MessageStream, StreamError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if *self.refuse.lock().unwrap() {
            return Err(StreamError::Connection("connection refused".to_string()));
        }

        let (tx, rx) = mpsc::unbounded();
        *self.server.lock().unwrap() = Some(tx);
        let stream: MessageStream = Box::pin(rx);
        Ok(stream)
    }
}
