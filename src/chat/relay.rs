//! Message relay for relay-chat.
//!
//! The relay owns the connection registry and the history buffer. All state
//! sits behind one lock and every handler runs to completion while holding
//! it, so inbound events are applied one at a time in arrival order.

use tokio::sync::Mutex;

use crate::datetime::{now_millis, Timestamp};

use super::event::{ClientEvent, HistoryEntry, ServerEvent};
use super::history::{HistoryBuffer, DEFAULT_HISTORY_CAPACITY};
use super::registry::{Connection, ConnectionId, ConnectionRegistry, EventSender};

/// Result of handling one inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// An event was fanned out to this many open connections.
    Broadcast {
        /// Number of connections the event was queued for.
        recipients: usize,
    },
    /// The frame decoded to an event type the relay does not act on.
    Ignored,
    /// The frame could not be decoded.
    Malformed,
}

struct RelayState {
    registry: ConnectionRegistry,
    history: HistoryBuffer,
}

/// Shared chat relay. Wrap in an `Arc` and hand to each socket handler.
pub struct Relay {
    state: Mutex<RelayState>,
}

impl Relay {
    /// Create a relay with the default history capacity.
    pub fn new() -> Self {
        Self::with_history_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create a relay keeping at most `capacity` messages for replay.
    pub fn with_history_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(RelayState {
                registry: ConnectionRegistry::new(),
                history: HistoryBuffer::with_capacity(capacity),
            }),
        }
    }

    /// Attach a new connection.
    ///
    /// The current history is queued for the new connection before it is
    /// registered, so it sees every later broadcast exactly once.
    pub async fn connect(&self, sender: EventSender) -> ConnectionId {
        let connection = Connection::new(sender);
        let id = connection.id();

        let mut state = self.state.lock().await;
        let items = state.history.snapshot();
        let replayed = items.len();
        if !connection.send(ServerEvent::history(items)) {
            tracing::debug!(connection = %id, "Connection closed before history replay");
        }
        state.registry.register(connection);

        tracing::debug!(
            connection = %id,
            replayed,
            connections = state.registry.len(),
            "Connection registered"
        );
        id
    }

    /// Detach a connection. Safe to call more than once.
    pub async fn disconnect(&self, id: ConnectionId) -> bool {
        let mut state = self.state.lock().await;
        let removed = state.registry.unregister(&id);
        if removed {
            tracing::debug!(
                connection = %id,
                connections = state.registry.len(),
                "Connection unregistered"
            );
        }
        removed
    }

    /// Handle a raw text frame from any connection.
    ///
    /// Malformed input is logged and dropped; it never affects relay state.
    pub async fn handle_text(&self, raw: &str) -> RelayOutcome {
        match ClientEvent::decode(raw) {
            Ok(event) => self.handle_event(event).await,
            Err(e) => {
                tracing::warn!(error = %e, raw = %truncate(raw, 200), "Bad JSON from client");
                RelayOutcome::Malformed
            }
        }
    }

    /// Handle a decoded client event.
    pub async fn handle_event(&self, event: ClientEvent) -> RelayOutcome {
        self.handle_event_at(event, now_millis()).await
    }

    /// Handle a decoded client event received at `now`.
    async fn handle_event_at(&self, event: ClientEvent, now: Timestamp) -> RelayOutcome {
        match event {
            ClientEvent::Join { name } => {
                let state = self.state.lock().await;
                let recipients = broadcast(&state.registry, &ServerEvent::joined(&name, now));
                tracing::info!(name = %name, recipients, "Client joined");
                RelayOutcome::Broadcast { recipients }
            }
            ClientEvent::Message { name, text, time } => {
                let entry = HistoryEntry::new(name, text, resolve_time(time, now));

                let mut state = self.state.lock().await;
                state.history.append(entry.clone());
                let recipients = broadcast(&state.registry, &ServerEvent::from(entry));
                tracing::debug!(
                    recipients,
                    history = state.history.len(),
                    "Message relayed"
                );
                RelayOutcome::Broadcast { recipients }
            }
            ClientEvent::Unknown => {
                tracing::debug!("Ignoring unknown event type");
                RelayOutcome::Ignored
            }
        }
    }

    /// Copy of the stored history, oldest first.
    pub async fn history_snapshot(&self) -> Vec<HistoryEntry> {
        self.state.lock().await.history.snapshot()
    }

    /// Number of registered connections.
    pub async fn connection_count(&self) -> usize {
        self.state.lock().await.registry.len()
    }
}

impl Default for Relay {
    fn default() -> Self {
        Self::new()
    }
}

/// Client time wins when present and non-zero; otherwise the server clock.
fn resolve_time(client_time: Option<Timestamp>, now: Timestamp) -> Timestamp {
    match client_time {
        Some(time) if time != 0 => time,
        _ => now,
    }
}

/// Queue `event` on every open connection. Best effort, no retries.
fn broadcast(registry: &ConnectionRegistry, event: &ServerEvent) -> usize {
    registry.for_each_open(|connection| {
        connection.send(event.clone());
    })
}

fn truncate(raw: &str, max_chars: usize) -> &str {
    match raw.char_indices().nth(max_chars) {
        Some((idx, _)) => &raw[..idx],
        None => raw,
    }
}
