//! View models for the history list and the transcript.
//!
//! Pure functions of their input: rendering twice without a mutation in
//! between yields identical output.

use chrono::{DateTime, Local, TimeZone, Utc};

use crate::types::{Message, Role, Session, SessionId};

/// One row of the conversation history list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: SessionId,
    pub title: String,
    /// Last update, `MM/DD HH:MM` in local time.
    pub time_label: String,
    pub message_count: usize,
    pub active: bool,
}

/// One rendered transcript line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscriptLine {
    pub role: Role,
    pub content: String,
    /// `HH:MM` in local time.
    pub time_label: String,
}

pub fn render_history(sessions: &[Session]) -> Vec<HistoryEntry> {
    render_history_in(sessions, &Local)
}

pub fn render_transcript(messages: &[Message]) -> Vec<TranscriptLine> {
    render_transcript_in(messages, &Local)
}

/// [`render_history`] with an explicit time zone.
pub fn render_history_in<Tz: TimeZone>(sessions: &[Session], tz: &Tz) -> Vec<HistoryEntry>
where
    Tz::Offset: std::fmt::Display,
{
    sessions
        .iter()
        .map(|s| HistoryEntry {
            id: s.id.clone(),
            title: s.title.clone(),
            time_label: format_in(&s.updated_at, tz, "%m/%d %H:%M"),
            message_count: s.messages.len(),
            active: s.active,
        })
        .collect()
}

/// [`render_transcript`] with an explicit time zone.
pub fn render_transcript_in<Tz: TimeZone>(messages: &[Message], tz: &Tz) -> Vec<TranscriptLine>
where
    Tz::Offset: std::fmt::Display,
{
    messages
        .iter()
        .map(|m| TranscriptLine {
            role: m.role,
            content: m.content.clone(),
            time_label: format_in(&m.timestamp, tz, "%H:%M"),
        })
        .collect()
}

fn format_in<Tz: TimeZone>(ts: &DateTime<Utc>, tz: &Tz, fmt: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    ts.with_timezone(tz).format(fmt).to_string()
}
