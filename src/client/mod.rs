//! Client module for relay-chat.
//!
//! This module provides the client half of the protocol:
//! - Session lifecycle with a fixed-delay reconnect loop
//! - Own/incoming classification of relayed messages
//! - Renderers for the terminal and for in-memory recording

mod render;
mod session;

pub use render::{
    classify, lines_for_event, ConnectionStatus, LineKind, MemoryRenderer, RenderedLine, Renderer,
    TerminalRenderer,
};
pub use session::{
    websocket_url, ClientSession, SessionHandle, DEFAULT_RECONNECT_DELAY, WS_PATH,
};
