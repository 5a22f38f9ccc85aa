//! WebSocket module for real-time communication.
//!
//! Clients connect at `/ws` and exchange JSON events with the relay.

pub mod chat;

pub use chat::{chat_ws_handler, ChatWsState};
