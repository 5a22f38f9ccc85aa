//! Test helpers for relay-chat integration tests.
//!
//! Provides a running server and a raw WebSocket TestClient.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use relay_chat::config::{ChatConfig, ServerConfig};
use relay_chat::{Relay, WebServer};

/// Default timeout for test operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Static asset directory shipped with the crate.
pub fn public_dir() -> String {
    format!("{}/public", env!("CARGO_MANIFEST_DIR"))
}

/// Server configuration bound to a random local port.
pub fn test_server_config(port: u16) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port,
        static_path: public_dir(),
    }
}

/// Start a server on a random port.
pub async fn start_server() -> (SocketAddr, Arc<Relay>) {
    start_server_on(0).await
}

/// Start a server on the given port.
pub async fn start_server_on(port: u16) -> (SocketAddr, Arc<Relay>) {
    let server = WebServer::new(&test_server_config(port), &ChatConfig::default())
        .expect("Failed to create server");
    let relay = server.relay();
    let addr = server.run_with_addr().await.expect("Failed to start server");
    (addr, relay)
}

/// Poll `check` until it returns true or the default timeout expires.
pub async fn wait_for<F>(mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + DEFAULT_TIMEOUT;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

/// Wait until the relay has exactly `expected` registered connections.
pub async fn wait_for_connections(relay: &Relay, expected: usize) -> bool {
    let deadline = tokio::time::Instant::now() + DEFAULT_TIMEOUT;
    while tokio::time::Instant::now() < deadline {
        if relay.connection_count().await == expected {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

/// Raw WebSocket client speaking JSON frames.
pub struct TestClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    /// Connect to the chat WebSocket of the server at `addr`.
    pub async fn connect(addr: SocketAddr) -> Self {
        let (stream, _) = connect_async(format!("ws://{addr}/ws"))
            .await
            .expect("Failed to connect");
        Self { stream }
    }

    /// Connect and consume the initial history event, returning its items.
    ///
    /// Once this returns, the connection is registered for broadcasts.
    pub async fn connect_with_history(addr: SocketAddr) -> (Self, Vec<Value>) {
        let mut client = Self::connect(addr).await;
        let history = client.recv().await;
        assert_eq!(history["type"], "history");
        let items = history["items"].as_array().cloned().unwrap_or_default();
        (client, items)
    }

    /// Send a raw text frame.
    pub async fn send_raw(&mut self, text: &str) {
        self.stream
            .send(Message::Text(text.to_string()))
            .await
            .expect("Failed to send");
    }

    /// Send a JSON value as a text frame.
    pub async fn send_json(&mut self, value: Value) {
        self.send_raw(&value.to_string()).await;
    }

    /// Receive the next text frame as JSON.
    pub async fn recv(&mut self) -> Value {
        self.try_recv(DEFAULT_TIMEOUT)
            .await
            .expect("Timed out waiting for event")
    }

    /// Receive the next text frame as JSON, or None on timeout.
    pub async fn try_recv(&mut self, duration: Duration) -> Option<Value> {
        let result = timeout(duration, async {
            while let Some(frame) = self.stream.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        return Some(serde_json::from_str(&text).expect("Server sent bad JSON"));
                    }
                    Ok(Message::Close(_)) | Err(_) => return None,
                    Ok(_) => continue,
                }
            }
            None
        })
        .await;
        result.ok().flatten()
    }

    /// Close the connection.
    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}
