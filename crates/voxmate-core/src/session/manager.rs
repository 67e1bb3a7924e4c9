//! Session lifecycle: create, switch, delete, append, title.
//!
//! Invariants held after every public call:
//! - the collection is never empty
//! - exactly one session is `active`, and it is the current one
//! - at most [`MAX_SESSIONS`] sessions, newest first

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::store::{SessionStore, MAX_SESSIONS};
use crate::events::{EventSink, Severity, ViewEvent};
use crate::types::{Message, Role, Session, SessionId, WireMessage};

/// Title of a session that has no user message yet.
pub const DEFAULT_TITLE: &str = "New conversation";

/// Characters of the first user message kept in a title.
pub const TITLE_MAX_CHARS: usize = 20;

/// Title for a message list: the first user message, cut to
/// [`TITLE_MAX_CHARS`] characters with `"..."` appended when cut.
pub fn generate_title(messages: &[Message]) -> String {
    let Some(first) = messages.iter().find(|m| m.role == Role::User) else {
        return DEFAULT_TITLE.to_string();
    };

    let mut chars = first.content.chars();
    let head: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Owns the session collection and writes it through a [`SessionStore`].
pub struct SessionManager {
    store: SessionStore,
    /// Newest first.
    sessions: Vec<Session>,
    current: Option<SessionId>,
    sink: Arc<dyn EventSink>,
}

impl SessionManager {
    /// Load persisted sessions and repair them into a valid state.
    ///
    /// An unreadable snapshot is discarded and replaced by one fresh
    /// session.
    pub fn open(store: SessionStore, sink: Arc<dyn EventSink>) -> Self {
        let sessions = store.load();
        let mut manager = SessionManager {
            store,
            sessions,
            current: None,
            sink,
        };
        manager.repair();
        manager
    }

    fn repair(&mut self) {
        let mut changed = false;
        if self.sessions.len() > MAX_SESSIONS {
            self.sessions.truncate(MAX_SESSIONS);
            changed = true;
        }

        let mut seen_active = false;
        for session in &mut self.sessions {
            if session.active {
                if seen_active {
                    session.active = false;
                    changed = true;
                }
                seen_active = true;
            }
        }
        if !seen_active {
            if let Some(head) = self.sessions.first_mut() {
                head.active = true;
                changed = true;
            }
        }

        self.current = self
            .sessions
            .iter()
            .find(|s| s.active)
            .map(|s| s.id.clone());

        match &self.current {
            None => {
                self.create_session();
            }
            Some(id) => {
                debug!(session = %id, sessions = self.sessions.len(), "restored sessions");
                if changed {
                    self.persist();
                }
            }
        }
    }

    // ── queries ──

    /// All sessions, newest first.
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn get(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.iter().find(|s| &s.id == id)
    }

    pub fn current_id(&self) -> Option<&SessionId> {
        self.current.as_ref()
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref().and_then(|id| self.get(id))
    }

    /// The working message buffer: the current session's messages.
    pub fn transcript(&self) -> &[Message] {
        self.current().map(|s| s.messages.as_slice()).unwrap_or(&[])
    }

    /// A session's messages in chat-request form. Empty for unknown ids.
    pub fn wire_history(&self, id: &SessionId) -> Vec<WireMessage> {
        self.get(id)
            .map(|s| s.messages.iter().map(Message::to_wire).collect())
            .unwrap_or_default()
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    fn index_of(&self, id: &SessionId) -> Option<usize> {
        self.sessions.iter().position(|s| &s.id == id)
    }

    // ── lifecycle ──

    /// Start a new conversation and make it current.
    ///
    /// The oldest sessions beyond [`MAX_SESSIONS`] are dropped silently.
    pub fn create_session(&mut self) -> SessionId {
        for session in &mut self.sessions {
            session.active = false;
        }

        let session = Session::new(DEFAULT_TITLE);
        let id = session.id.clone();
        self.sessions.insert(0, session);

        if self.sessions.len() > MAX_SESSIONS {
            let evicted = self.sessions.split_off(MAX_SESSIONS);
            debug!(evicted = evicted.len(), "evicted oldest sessions");
        }

        self.current = Some(id.clone());
        info!(session = %id, "created session");

        self.persist();
        self.sink.emit(ViewEvent::HistoryChanged);
        self.sink.emit(ViewEvent::TranscriptChanged);
        id
    }

    /// Make `id` the current session. Returns `false` if it is unknown.
    pub fn switch_session(&mut self, id: &SessionId) -> bool {
        let Some(idx) = self.index_of(id) else {
            debug!(session = %id, "switch to unknown session ignored");
            return false;
        };

        for session in &mut self.sessions {
            session.active = false;
        }
        self.sessions[idx].active = true;
        self.current = Some(id.clone());
        info!(session = %id, title = %self.sessions[idx].title, "switched session");

        self.persist();
        self.sink.emit(ViewEvent::HistoryChanged);
        self.sink.emit(ViewEvent::TranscriptChanged);
        true
    }

    /// Remove a session. Returns `false` if it is unknown.
    ///
    /// Deleting the current session activates the newest remaining one, or
    /// starts a fresh session if none remain.
    pub fn delete_session(&mut self, id: &SessionId) -> bool {
        let Some(idx) = self.index_of(id) else {
            debug!(session = %id, "delete of unknown session ignored");
            return false;
        };

        let removed = self.sessions.remove(idx);
        info!(session = %id, "deleted session");

        let was_current = removed.active || self.current.as_ref() == Some(id);
        if was_current {
            match self.sessions.first_mut() {
                Some(head) => {
                    head.active = true;
                    self.current = Some(head.id.clone());
                    self.sink.emit(ViewEvent::TranscriptChanged);
                }
                None => {
                    self.current = None;
                    self.create_session();
                    return true;
                }
            }
        }

        self.persist();
        self.sink.emit(ViewEvent::HistoryChanged);
        true
    }

    /// Id of the current session, creating one if there is none.
    pub fn ensure_current(&mut self) -> SessionId {
        match &self.current {
            Some(id) if self.index_of(id).is_some() => id.clone(),
            _ => self.create_session(),
        }
    }

    /// Append to the current session, creating one if needed.
    pub fn append_message(&mut self, role: Role, content: impl Into<String>) -> Message {
        let id = self.ensure_current();
        let idx = self.index_of(&id).unwrap_or(0);
        self.push_message(idx, role, content.into())
    }

    /// Append to a specific session. `None` if it no longer exists.
    pub fn append_to(
        &mut self,
        id: &SessionId,
        role: Role,
        content: impl Into<String>,
    ) -> Option<Message> {
        match self.index_of(id) {
            Some(idx) => Some(self.push_message(idx, role, content.into())),
            None => {
                warn!(session = %id, role = %role, "session vanished before append; message dropped");
                None
            }
        }
    }

    fn push_message(&mut self, idx: usize, role: Role, content: String) -> Message {
        let message = Message::new(role, content);
        let session = &mut self.sessions[idx];
        session.messages.push(message.clone());

        if role == Role::User && session.user_message_count() == 1 {
            session.title = generate_title(&session.messages);
            debug!(session = %session.id, title = %session.title, "titled session");
        }
        session.updated_at = message.timestamp;

        self.persist();
        self.sink.emit(ViewEvent::HistoryChanged);
        message
    }

    /// Empty the current conversation and reopen its title.
    pub fn clear_current(&mut self) {
        let Some(idx) = self.current.clone().and_then(|id| self.index_of(&id)) else {
            return;
        };

        let session = &mut self.sessions[idx];
        session.messages.clear();
        session.title = DEFAULT_TITLE.to_string();
        session.updated_at = Utc::now();
        info!(session = %session.id, "cleared session");

        self.persist();
        self.sink.emit(ViewEvent::HistoryChanged);
        self.sink.emit(ViewEvent::TranscriptChanged);
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.sessions) {
            warn!(error = %e, "failed to persist sessions");
            self.sink.emit(ViewEvent::notify(
                "Could not save conversations",
                Severity::Warning,
            ));
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("dir", &self.store.dir())
            .field("sessions", &self.sessions.len())
            .field("current", &self.current)
            .finish()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
