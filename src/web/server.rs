//! Web server for relay-chat.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;

use crate::chat::Relay;
use crate::config::{ChatConfig, ServerConfig};
use crate::{ChatError, Result};

use super::router::create_router;

/// Web server hosting the relay and the static client.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Static asset directory.
    static_path: String,
    /// Shared relay.
    relay: Arc<Relay>,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(server: &ServerConfig, chat: &ChatConfig) -> Result<Self> {
        let addr = format!("{}:{}", server.host, server.port)
            .parse()
            .map_err(|e| ChatError::Config(format!("invalid listen address: {e}")))?;

        Ok(Self {
            addr,
            static_path: server.static_path.clone(),
            relay: Arc::new(Relay::with_history_capacity(chat.history_capacity)),
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get a handle to the relay.
    pub fn relay(&self) -> Arc<Relay> {
        self.relay.clone()
    }

    async fn bind(self) -> Result<(TcpListener, axum::Router)> {
        let router = create_router(self.relay, &self.static_path).layer(CompressionLayer::new());
        let listener = TcpListener::bind(self.addr).await?;
        Ok((listener, router))
    }

    /// Run the web server.
    pub async fn run(self) -> Result<()> {
        let (listener, router) = self.bind().await?;
        tracing::info!("Server listening on http://{}", listener.local_addr()?);

        axum::serve(listener, router).await?;
        Ok(())
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> Result<SocketAddr> {
        let (listener, router) = self.bind().await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}
