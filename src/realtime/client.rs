//! Long-lived push-stream client.
//!
//! ```text
//! Disconnected -> start() -> Connecting
//! Connecting   -> open ok -> Connected
//! Connecting   -> open failed -> Erroring -> Reconnecting -(delay)-> Connecting
//! Connected    -> error/close -> Erroring -> Reconnecting -(delay)-> Connecting
//! any          -> stop() -> Closed (terminal)
//! ```
//!
//! The driver task, its reconnect timer and the open connection all hang off
//! one `ActiveConnection`; `stop()` cancels its token and aborts the task, so
//! nothing can reconnect afterwards.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::connector::StreamConnector;
use super::router::{InvalidationRouter, HANDSHAKE_TYPE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Disconnected,
    Connecting,
    Connected,
    Erroring,
    Reconnecting,
    Closed,
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamState::Disconnected => write!(f, "disconnected"),
            StreamState::Connecting => write!(f, "connecting"),
            StreamState::Connected => write!(f, "connected"),
            StreamState::Erroring => write!(f, "erroring"),
            StreamState::Reconnecting => write!(f, "reconnecting"),
            StreamState::Closed => write!(f, "closed"),
        }
    }
}

/// What happened to one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    Malformed,
    Handshake,
    /// Tag not in this client's vocabulary.
    Ignored,
    Routed(&'static [&'static str]),
}

#[derive(Deserialize)]
struct PushMessage {
    #[serde(rename = "type")]
    kind: String,
}

struct Shared {
    connector: Arc<dyn StreamConnector>,
    router: InvalidationRouter,
    reconnect_delay: Duration,
    state: watch::Sender<StreamState>,
    attempts: AtomicU64,
}

impl Shared {
    /// `Closed` is terminal; late transitions from a dying task are dropped.
    fn set_state(&self, next: StreamState) {
        self.state.send_if_modified(|current| {
            if *current == StreamState::Closed || *current == next {
                return false;
            }
            debug!("push stream {current} -> {next}");
            *current = next;
            true
        });
    }

    fn handle_message(&self, text: &str) -> MessageOutcome {
        let message: PushMessage = match serde_json::from_str(text) {
            Ok(message) => message,
            Err(e) => {
                debug!("dropping malformed push message: {e}");
                return MessageOutcome::Malformed;
            }
        };

        if message.kind == HANDSHAKE_TYPE {
            return MessageOutcome::Handshake;
        }

        let keys = self.router.route(&message.kind);
        if keys.is_empty() {
            MessageOutcome::Ignored
        } else {
            MessageOutcome::Routed(keys)
        }
    }

    async fn drive(self: Arc<Self>, cancel: CancellationToken) {
        loop {
            self.set_state(StreamState::Connecting);
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;

            let opened = tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                opened = self.connector.connect() => opened,
            };

            match opened {
                Ok(mut messages) => {
                    self.set_state(StreamState::Connected);
                    info!(attempt, "push stream connected");

                    loop {
                        let next = tokio::select! {
                            biased;
                            _ = cancel.cancelled() => return,
                            next = messages.next() => next,
                        };
                        match next {
                            Some(Ok(text)) => {
                                self.handle_message(&text);
                            }
                            Some(Err(e)) => {
                                warn!("push stream failed: {e}");
                                break;
                            }
                            None => {
                                info!("push stream closed by server");
                                break;
                            }
                        }
                    }
                }
                Err(e) => warn!(attempt, "failed to open push stream: {e}"),
            }

            self.set_state(StreamState::Erroring);
            self.set_state(StreamState::Reconnecting);
            debug!("reconnecting push stream in {:?}", self.reconnect_delay);

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                _ = sleep(self.reconnect_delay) => {}
            }
        }
    }
}

struct ActiveConnection {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ActiveConnection {
    fn shutdown(self) {
        self.cancel.cancel();
        self.task.abort();
    }
}

pub struct StreamClient {
    shared: Arc<Shared>,
    active: Mutex<Option<ActiveConnection>>,
}

impl StreamClient {
    pub fn new(
        connector: Arc<dyn StreamConnector>,
        router: InvalidationRouter,
        reconnect_delay: Duration,
    ) -> Self {
        let (state, _) = watch::channel(StreamState::Disconnected);
        Self {
            shared: Arc::new(Shared {
                connector,
                router,
                reconnect_delay,
                state,
                attempts: AtomicU64::new(0),
            }),
            active: Mutex::new(None),
        }
    }

    /// Begin maintaining the connection. No-op while a connection (or a
    /// pending reconnect) exists, and after `stop()`.
    pub fn start(&self) {
        let mut active = self.active.lock().expect("stream client mutex poisoned");
        if active.is_some() {
            return;
        }
        if self.state() == StreamState::Closed {
            debug!("push stream client already stopped, ignoring start");
            return;
        }

        let cancel = CancellationToken::new();
        self.shared.set_state(StreamState::Connecting);
        let task = tokio::spawn(Arc::clone(&self.shared).drive(cancel.clone()));
        *active = Some(ActiveConnection { cancel, task });
    }

    /// Cancel any pending reconnect, close the connection, and stay closed.
    pub fn stop(&self) {
        let mut active = self.active.lock().expect("stream client mutex poisoned");
        if let Some(connection) = active.take() {
            connection.shutdown();
        }
        self.shared.set_state(StreamState::Closed);
        info!("push stream client stopped");
    }

    pub fn state(&self) -> StreamState {
        *self.shared.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<StreamState> {
        self.shared.state.subscribe()
    }

    /// Connection attempts made so far, including the first.
    pub fn connect_attempts(&self) -> u64 {
        self.shared.attempts.load(Ordering::SeqCst)
    }

    /// Dispatch one raw message as if it had arrived on the stream.
    pub fn handle_message(&self, text: &str) -> MessageOutcome {
        self.shared.handle_message(text)
    }
}

impl Drop for StreamClient {
    fn drop(&mut self) {
        if let Ok(mut active) = self.active.lock() {
            if let Some(connection) = active.take() {
                connection.shutdown();
            }
        }
    }
}
