//! relay-chat - minimal real-time group chat.
//!
//! A WebSocket relay that fans messages out to every connected client and
//! replays a bounded history to newcomers, plus a client session that
//! speaks the same protocol.

pub mod chat;
pub mod client;
pub mod config;
pub mod datetime;
pub mod error;
pub mod logging;
pub mod web;

pub use chat::{
    ClientEvent, Connection, ConnectionId, ConnectionRegistry, HistoryBuffer, HistoryEntry, Relay,
    RelayOutcome, ServerEvent,
};
pub use client::{ClientSession, ConnectionStatus, LineKind, RenderedLine, Renderer, SessionHandle};
pub use config::Config;
pub use error::{ChatError, Result};
pub use web::WebServer;
