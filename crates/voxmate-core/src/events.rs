//! View events: everything the core tells the UI.
//!
//! The core never renders. It emits [`ViewEvent`]s into an [`EventSink`];
//! the front end decides what a history refresh or a notification looks
//! like.

use std::fmt;

use tokio::sync::mpsc;

use crate::status::{IndicatorState, Service};

/// How loudly a notification should be shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(s)
    }
}

/// An outbound UI event.
#[derive(Clone, Debug, PartialEq)]
pub enum ViewEvent {
    /// The session list (titles, order, active flag, counts) changed.
    HistoryChanged,
    /// The current transcript must be redrawn from scratch.
    TranscriptChanged,
    /// A service indicator moved to a new state.
    StatusChanged {
        service: Service,
        state: IndicatorState,
    },
    LoadingShown,
    LoadingHidden,
    /// A transient, non-blocking message for the user.
    Notification { message: String, severity: Severity },
}

impl ViewEvent {
    pub fn notify(message: impl Into<String>, severity: Severity) -> Self {
        ViewEvent::Notification {
            message: message.into(),
            severity,
        }
    }
}

/// Observer for view events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ViewEvent);
}

/// Drops every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: ViewEvent) {}
}

/// Forwards events into an unbounded tokio channel.
///
/// Emitting never blocks; if the receiver is gone the event is dropped.
#[derive(Clone, Debug)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ViewEvent>,
}

impl ChannelSink {
    /// Create a sink plus the receiver the front end drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ViewEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelSink { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: ViewEvent) {
        let _ = self.tx.send(event);
    }
}

/// Drain everything currently queued on a receiver without waiting.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<ViewEvent>) -> Vec<ViewEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
