//! Web module for relay-chat.
//!
//! Serves the browser client as static files and hosts the chat
//! WebSocket at `/ws` on the same port.

pub mod router;
pub mod server;
pub mod ws;

pub use router::create_router;
pub use server::WebServer;
