//! Wire events exchanged over the chat WebSocket.
//!
//! Every frame is a JSON object whose `type` tag selects the variant.
//! Unrecognized tags decode to `Unknown` so newer peers can add event
//! types without breaking older ones.

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::datetime::Timestamp;

/// A stored chat message, replayed to newly connected clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Sender's display name.
    pub name: String,
    /// Message text.
    pub text: String,
    /// Send time in epoch milliseconds.
    pub time: Timestamp,
}

impl HistoryEntry {
    /// Create a new history entry.
    pub fn new(name: impl Into<String>, text: impl Into<String>, time: Timestamp) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            time,
        }
    }
}

/// Events sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Announce a display name.
    Join {
        /// Display name.
        name: String,
    },
    /// Post a chat message.
    Message {
        /// Sender's display name.
        name: String,
        /// Message text.
        text: String,
        /// Client send time; the server substitutes its own when absent or falsy.
        #[serde(
            default,
            deserialize_with = "deserialize_client_time",
            skip_serializing_if = "Option::is_none"
        )]
        time: Option<Timestamp>,
    },
    /// Any event type this build does not know.
    #[serde(other)]
    Unknown,
}

impl ClientEvent {
    /// Decode a raw text frame.
    pub fn decode(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// Create a join event.
    pub fn join(name: impl Into<String>) -> Self {
        Self::Join { name: name.into() }
    }

    /// Create a message event stamped with the given time.
    pub fn message(name: impl Into<String>, text: impl Into<String>, time: Timestamp) -> Self {
        Self::Message {
            name: name.into(),
            text: text.into(),
            time: Some(time),
        }
    }
}

/// Decode a client-supplied `time`.
///
/// Falsy JSON values (`null`, `false`, `0`, `""`) mean "not set". Numbers are
/// taken as epoch milliseconds, fractions truncated. Anything else is rejected.
fn deserialize_client_time<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::Number(n)) => {
            let millis = match n.as_i64() {
                Some(millis) => millis,
                None => match n.as_f64() {
                    Some(f) if f.is_finite() && f.abs() < i64::MAX as f64 => f as i64,
                    _ => return Err(de::Error::custom(format!("time out of range: {n}"))),
                },
            };
            Ok((millis != 0).then_some(millis))
        }
        Some(other) => Err(de::Error::custom(format!(
            "time must be epoch milliseconds, got {other}"
        ))),
    }
}

/// Events sent from server to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A relayed chat message.
    Message {
        /// Sender's display name.
        name: String,
        /// Message text.
        text: String,
        /// Send time in epoch milliseconds.
        time: Timestamp,
    },
    /// Server status line.
    System {
        /// Status text.
        text: String,
        /// Server time in epoch milliseconds.
        time: Timestamp,
    },
    /// Recent messages, oldest first.
    History {
        /// Stored entries in arrival order.
        items: Vec<HistoryEntry>,
    },
    /// Any event type this build does not know.
    #[serde(other)]
    Unknown,
}

impl ServerEvent {
    /// Decode a raw text frame.
    pub fn decode(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// Create a system event.
    pub fn system(text: impl Into<String>, time: Timestamp) -> Self {
        Self::System {
            text: text.into(),
            time,
        }
    }

    /// Create the "<name> joined." announcement.
    pub fn joined(name: &str, time: Timestamp) -> Self {
        Self::system(format!("{name} joined."), time)
    }

    /// Create a history event.
    pub fn history(items: Vec<HistoryEntry>) -> Self {
        Self::History { items }
    }
}

impl From<HistoryEntry> for ServerEvent {
    fn from(entry: HistoryEntry) -> Self {
        Self::Message {
            name: entry.name,
            text: entry.text,
            time: entry.time,
        }
    }
}
