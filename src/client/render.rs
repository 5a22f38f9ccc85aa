//! Rendering of server events on the client side.
//!
//! Messages are classified as own or incoming by comparing the sender name
//! with the local display name. The server echoes every message back to its
//! sender, so this comparison is the only way to tell them apart.

use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::chat::ServerEvent;
use crate::datetime::{format_clock, Timestamp};

/// Connection status shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Waiting to (re)connect.
    Disconnected,
    /// Connection attempt in progress.
    Connecting,
    /// Connected and joined.
    Connected,
}

impl ConnectionStatus {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "Disconnected",
            ConnectionStatus::Connecting => "Connecting",
            ConnectionStatus::Connected => "Connected",
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of a rendered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Written by the local user.
    Own,
    /// Written by someone else.
    Incoming,
    /// Server status line.
    System,
}

/// A line ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    /// Line kind.
    pub kind: LineKind,
    /// Sender name (None for system lines).
    pub name: Option<String>,
    /// Text body.
    pub text: String,
    /// Time in epoch milliseconds.
    pub time: Timestamp,
}

impl RenderedLine {
    /// Create a chat line, classified against the local name.
    pub fn chat(name: &str, text: &str, time: Timestamp, local_name: &str) -> Self {
        Self {
            kind: classify(name, local_name),
            name: Some(name.to_string()),
            text: text.to_string(),
            time,
        }
    }

    /// Create a system line.
    pub fn system(text: impl Into<String>, time: Timestamp) -> Self {
        Self {
            kind: LineKind::System,
            name: None,
            text: text.into(),
            time,
        }
    }

    /// Format the line for a terminal.
    pub fn format(&self) -> String {
        let clock = format_clock(self.time);
        match (self.kind, &self.name) {
            (LineKind::Own, _) => format!("[{clock}] me: {}", self.text),
            (LineKind::Incoming, Some(name)) => format!("[{clock}] <{name}> {}", self.text),
            (LineKind::Incoming, None) => format!("[{clock}] {}", self.text),
            (LineKind::System, _) => format!("[{clock}] *** {}", self.text),
        }
    }
}

/// Own if the sender name equals the local display name.
pub fn classify(name: &str, local_name: &str) -> LineKind {
    if name == local_name {
        LineKind::Own
    } else {
        LineKind::Incoming
    }
}

/// Lines to render for one server event, in display order.
pub fn lines_for_event(event: &ServerEvent, local_name: &str) -> Vec<RenderedLine> {
    match event {
        ServerEvent::Message { name, text, time } => {
            vec![RenderedLine::chat(name, text, *time, local_name)]
        }
        ServerEvent::System { text, time } => vec![RenderedLine::system(text.clone(), *time)],
        ServerEvent::History { items } => items
            .iter()
            .map(|item| RenderedLine::chat(&item.name, &item.text, item.time, local_name))
            .collect(),
        ServerEvent::Unknown => Vec::new(),
    }
}

/// Output surface of a client session.
pub trait Renderer: Send + 'static {
    /// Display one line.
    fn render(&mut self, line: &RenderedLine);

    /// Display a connection status change.
    fn status(&mut self, status: ConnectionStatus);
}

/// Renderer printing to stdout.
#[derive(Debug, Default)]
pub struct TerminalRenderer;

impl Renderer for TerminalRenderer {
    fn render(&mut self, line: &RenderedLine) {
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "{}", line.format());
    }

    fn status(&mut self, status: ConnectionStatus) {
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "-- {status} --");
    }
}

#[derive(Debug, Default)]
struct MemoryLog {
    lines: Vec<RenderedLine>,
    statuses: Vec<ConnectionStatus>,
}

/// Renderer that records everything in memory.
///
/// Clones share the same log, so one clone can be handed to a session
/// while another is inspected.
#[derive(Debug, Clone, Default)]
pub struct MemoryRenderer {
    log: Arc<Mutex<MemoryLog>>,
}

impl MemoryRenderer {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    fn log(&self) -> MutexGuard<'_, MemoryLog> {
        self.log.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Lines rendered so far.
    pub fn lines(&self) -> Vec<RenderedLine> {
        self.log().lines.clone()
    }

    /// Status changes so far.
    pub fn statuses(&self) -> Vec<ConnectionStatus> {
        self.log().statuses.clone()
    }

    /// Most recent status, if any.
    pub fn last_status(&self) -> Option<ConnectionStatus> {
        self.log().statuses.last().copied()
    }
}

impl Renderer for MemoryRenderer {
    fn render(&mut self, line: &RenderedLine) {
        self.log().lines.push(line.clone());
    }

    fn status(&mut self, status: ConnectionStatus) {
        self.log().statuses.push(status);
    }
}
