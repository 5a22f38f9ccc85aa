//! Registry of open chat connections.
//!
//! Each connection is represented by the sending half of its outbound queue.
//! A per-socket writer task owns the receiving half; once that task stops,
//! the connection counts as closed and fan-out skips it. Queues are bounded;
//! a connection whose queue is full misses the event.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

use super::event::ServerEvent;

/// Unique identifier of a connection.
pub type ConnectionId = Uuid;

/// Outbound events buffered per connection before new ones are dropped.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// Sending half of a connection's outbound queue.
pub type EventSender = mpsc::Sender<ServerEvent>;

/// Receiving half of a connection's outbound queue.
pub type EventReceiver = mpsc::Receiver<ServerEvent>;

/// Create an outbound queue of `OUTBOUND_QUEUE_CAPACITY` events.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::channel(OUTBOUND_QUEUE_CAPACITY)
}

/// A connected client.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    sender: EventSender,
}

impl Connection {
    /// Wrap an outbound queue as a new connection with a fresh ID.
    pub fn new(sender: EventSender) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
        }
    }

    /// Get the connection ID.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Check whether the writer side is still alive.
    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Queue an event for this connection without waiting.
    ///
    /// Returns false if the connection has closed or its queue is full; the
    /// event is dropped in both cases.
    pub fn send(&self, event: ServerEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::debug!(connection = %self.id, "Outbound queue full, event dropped");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

/// Set of currently registered connections.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, Connection>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection.
    pub fn register(&mut self, connection: Connection) {
        self.connections.insert(connection.id(), connection);
    }

    /// Remove a connection.
    ///
    /// Returns true if the connection was registered. Removing an unknown
    /// or already removed connection is a no-op.
    pub fn unregister(&mut self, id: &ConnectionId) -> bool {
        self.connections.remove(id).is_some()
    }

    /// Call `f` on every open connection.
    ///
    /// Closed connections are skipped but left in place; they are pruned
    /// when their socket handler unregisters them. Returns the number of
    /// connections visited.
    pub fn for_each_open<F>(&self, mut f: F) -> usize
    where
        F: FnMut(&Connection),
    {
        let mut visited = 0;
        for connection in self.connections.values().filter(|c| c.is_open()) {
            f(connection);
            visited += 1;
        }
        visited
    }

    /// Number of registered connections, open or not.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether no connections are registered.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
