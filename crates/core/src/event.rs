//! Lifecycle events and the sinks that consume them.
//!
//! The agent emits one [`AgentEvent`] per phase transition. Events are
//! immutable and never stored by the loop itself; delivery and storage are
//! entirely up to the [`EventSink`] the caller hands to `run`.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tokio::sync::mpsc;

use crate::error::SinkError;

/// Kind of a lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Thinking,
    Action,
    Result,
    Answer,
    Error,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Thinking => "thinking",
            EventKind::Action => "action",
            EventKind::Result => "result",
            EventKind::Answer => "answer",
            EventKind::Error => "error",
        }
    }
}

/// A typed lifecycle event.
///
/// Serialises as `{"type": "action", "content": "...", "meta": "read_file"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,

    pub content: String,

    /// Extra context; for `action` events, the tool name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<String>,
}

impl AgentEvent {
    fn new(kind: EventKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            meta: None,
        }
    }

    pub fn thinking(content: impl Into<String>) -> Self {
        Self::new(EventKind::Thinking, content)
    }

    /// A tool dispatch; `content` carries the raw arguments JSON.
    pub fn action(tool: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            meta: Some(tool.into()),
            ..Self::new(EventKind::Action, arguments)
        }
    }

    pub fn result(content: impl Into<String>) -> Self {
        Self::new(EventKind::Result, content)
    }

    pub fn answer(content: impl Into<String>) -> Self {
        Self::new(EventKind::Answer, content)
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::new(EventKind::Error, content)
    }

    /// Event type name (for SSE event field).
    pub fn event_type(&self) -> &'static str {
        self.kind.as_str()
    }
}

/// A consumer of lifecycle events.
///
/// `accept` must not block materially. Errors are reported back to the
/// agent, which logs and ignores them.
pub trait EventSink: Send + Sync {
    fn accept(&self, event: AgentEvent) -> Result<(), SinkError>;
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn accept(&self, _event: AgentEvent) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Forwards events into an unbounded tokio channel.
///
/// Used by the gateway to turn a run into a live stream. Once the receiver
/// is dropped every `accept` fails with [`SinkError::Closed`].
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<AgentEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AgentEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn accept(&self, event: AgentEvent) -> Result<(), SinkError> {
        self.tx.send(event).map_err(|_| SinkError::Closed)
    }
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<AgentEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far.
    pub fn events(&self) -> Vec<AgentEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events().iter().map(|e| e.kind).collect()
    }

    pub fn into_events(self) -> Vec<AgentEvent> {
        self.events.into_inner().unwrap_or_default()
    }
}

impl EventSink for RecordingSink {
    fn accept(&self, event: AgentEvent) -> Result<(), SinkError> {
        let mut events = self
            .events
            .lock()
            .map_err(|e| SinkError::Delivery(e.to_string()))?;
        events.push(event);
        Ok(())
    }
}
