//! Chat module for relay-chat.
//!
//! This module provides the relay core:
//! - Wire events (join, message, system, history)
//! - Bounded history replayed to new connections
//! - Connection registry for fan-out
//! - The relay tying them together

mod event;
mod history;
mod registry;
mod relay;

pub use event::{ClientEvent, HistoryEntry, ServerEvent};
pub use history::{HistoryBuffer, DEFAULT_HISTORY_CAPACITY};
pub use registry::{
    event_channel, Connection, ConnectionId, ConnectionRegistry, EventReceiver, EventSender,
    OUTBOUND_QUEUE_CAPACITY,
};
pub use relay::{Relay, RelayOutcome};
