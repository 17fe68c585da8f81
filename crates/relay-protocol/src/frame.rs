//! Server-push frames.

use std::fmt::Write as _;

/// One outbound push unit: a fresh frame id, an optional event tag, and the
/// serialized payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Unique per frame.
    pub id: String,
    /// Event tag (`message`, `heartbeat`, `endpoint`, ...).
    pub event: Option<String>,
    /// Serialized payload.
    pub data: String,
}

impl Frame {
    /// Build a frame with a freshly generated id.
    pub fn new(event: Option<&str>, data: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            event: event.map(str::to_owned),
            data: data.into(),
        }
    }

    /// Render as an event-stream record terminated by a blank line.
    ///
    /// Multi-line payloads are split across several `data:` lines.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.data.len() + 64);
        let _ = writeln!(out, "id: {}", self.id);
        if let Some(event) = &self.event {
            let _ = writeln!(out, "event: {event}");
        }
        for line in self.data.split('\n') {
            let _ = writeln!(out, "data: {line}");
        }
        out.push('\n');
        out
    }
}
