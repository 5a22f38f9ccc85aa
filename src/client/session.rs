//! Client session for relay-chat.
//!
//! A session connects to the relay, announces its display name, renders
//! whatever the server sends and reconnects after a fixed delay whenever the
//! connection drops. There is no backoff and no retry limit; the loop ends
//! only when the session is shut down through its handle.

use std::time::Duration;

use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::chat::{ClientEvent, ServerEvent};
use crate::datetime::now_millis;
use crate::{ChatError, Result};

use super::render::{lines_for_event, ConnectionStatus, LineKind, RenderedLine, Renderer};

/// Path of the chat WebSocket on the server.
pub const WS_PATH: &str = "/ws";

/// Delay between a drop and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Longest wait for the WebSocket handshake before the attempt counts as failed.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

/// Derive the WebSocket URL from a page or server URL.
///
/// `http` becomes `ws` and `https` becomes `wss`; the path is always `/ws`.
pub fn websocket_url(base: &str) -> Result<Url> {
    let mut url = Url::parse(base)?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(ChatError::Url(format!("unsupported scheme: {other}"))),
    };
    url.set_scheme(scheme)
        .map_err(|_| ChatError::Url(format!("cannot use scheme {scheme} for {base}")))?;
    url.set_path(WS_PATH);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

#[derive(Debug)]
enum Command {
    Send(String),
    Shutdown,
}

enum Flow {
    Reconnect,
    Stop,
}

/// Handle for feeding input to a running session.
///
/// Dropping every handle stops the session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl SessionHandle {
    /// Submit a chat message.
    ///
    /// Returns false if the session has already stopped.
    pub fn send_message(&self, text: impl Into<String>) -> bool {
        self.commands.send(Command::Send(text.into())).is_ok()
    }

    /// Stop the session, closing the connection if one is open.
    pub fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
    }
}

/// One client's connection lifecycle.
pub struct ClientSession<R: Renderer> {
    name: String,
    url: Url,
    reconnect_delay: Duration,
    connect_timeout: Duration,
    renderer: R,
    status: ConnectionStatus,
    commands: mpsc::UnboundedReceiver<Command>,
}

impl<R: Renderer> ClientSession<R> {
    /// Create a session for `server_url` using the given display name.
    pub fn new(
        server_url: &str,
        name: impl Into<String>,
        renderer: R,
    ) -> Result<(Self, SessionHandle)> {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Self {
            name: name.into(),
            url: websocket_url(server_url)?,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            renderer,
            status: ConnectionStatus::Disconnected,
            commands: rx,
        };
        Ok((session, SessionHandle { commands: tx }))
    }

    /// Override the reconnect delay.
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Override the handshake timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Get the display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the WebSocket URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Get the current connection status.
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Run the connect/render/reconnect loop until shut down.
    pub async fn run(mut self) {
        loop {
            self.set_status(ConnectionStatus::Connecting);
            let attempt =
                tokio::time::timeout(self.connect_timeout, connect_async(self.url.as_str())).await;
            let flow = match attempt {
                Ok(Ok((stream, _))) => self.drive(stream).await,
                Ok(Err(e)) => {
                    tracing::warn!(url = %self.url, "Connection failed: {}", e);
                    Flow::Reconnect
                }
                Err(_) => {
                    tracing::warn!(
                        url = %self.url,
                        timeout_ms = self.connect_timeout.as_millis() as u64,
                        "Connection attempt timed out"
                    );
                    Flow::Reconnect
                }
            };
            self.set_status(ConnectionStatus::Disconnected);

            if let Flow::Stop = flow {
                break;
            }
            if let Flow::Stop = self.wait_for_retry().await {
                break;
            }
        }
        tracing::debug!(name = %self.name, "Client session stopped");
    }

    /// Serve one open connection until it drops or the session stops.
    async fn drive(&mut self, stream: WsStream) -> Flow {
        let (mut sink, mut source) = stream.split();
        self.set_status(ConnectionStatus::Connected);

        if let Err(e) = send_event(&mut sink, &ClientEvent::join(&self.name)).await {
            tracing::warn!("Failed to send join: {}", e);
            return Flow::Reconnect;
        }

        loop {
            tokio::select! {
                frame = source.next() => match frame {
                    Some(Ok(Message::Text(text))) => self.receive(&text),
                    Some(Ok(Message::Binary(data))) => match String::from_utf8(data) {
                        Ok(text) => self.receive(&text),
                        Err(_) => tracing::warn!("Ignoring non-UTF-8 binary frame"),
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::info!("Connection closed by server");
                        return Flow::Reconnect;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!("Connection error: {}", e);
                        return Flow::Reconnect;
                    }
                },
                command = self.commands.recv() => match command {
                    Some(Command::Send(text)) => {
                        if let Some(event) = self.compose(&text) {
                            if let Err(e) = send_event(&mut sink, &event).await {
                                tracing::warn!("Failed to send message: {}", e);
                                return Flow::Reconnect;
                            }
                        }
                    }
                    Some(Command::Shutdown) | None => {
                        let _ = sink.close().await;
                        return Flow::Stop;
                    }
                },
            }
        }
    }

    /// Wait out the reconnect delay while still accepting input.
    async fn wait_for_retry(&mut self) -> Flow {
        let retry = tokio::time::sleep(self.reconnect_delay);
        tokio::pin!(retry);

        loop {
            tokio::select! {
                _ = &mut retry => return Flow::Reconnect,
                command = self.commands.recv() => match command {
                    Some(Command::Send(text)) => {
                        if self.compose(&text).is_some() {
                            tracing::debug!("Not connected; message shown locally only");
                        }
                    }
                    Some(Command::Shutdown) | None => return Flow::Stop,
                },
            }
        }
    }

    /// Render a submitted message locally and build the event to transmit.
    ///
    /// Returns None for blank input.
    fn compose(&mut self, text: &str) -> Option<ClientEvent> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let time = now_millis();
        let line = RenderedLine {
            kind: LineKind::Own,
            name: Some(self.name.clone()),
            text: text.to_string(),
            time,
        };
        self.renderer.render(&line);
        Some(ClientEvent::message(&self.name, text, time))
    }

    /// Decode and render one frame from the server.
    fn receive(&mut self, raw: &str) {
        match ServerEvent::decode(raw) {
            Ok(ServerEvent::Unknown) => {
                tracing::debug!("Ignoring unknown event type from server");
            }
            Ok(event) => {
                for line in lines_for_event(&event, &self.name) {
                    self.renderer.render(&line);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Invalid message from server");
            }
        }
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        if self.status != status {
            self.status = status;
            self.renderer.status(status);
        }
    }
}

async fn send_event(sink: &mut WsSink, event: &ClientEvent) -> Result<()> {
    let json = serde_json::to_string(event)?;
    sink.send(Message::Text(json)).await?;
    Ok(())
}
