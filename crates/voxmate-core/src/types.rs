//! Core types for Voxmate: conversation model and backend wire format.
//!
//! Roles and indicator states are tagged enums rather than strings, so a
//! typo in a role can't silently create a third kind of message.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Messages
// ─────────────────────────────────────────────

/// Who authored a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One turn of a conversation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a message stamped with the current time.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Message {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Strip the timestamp for the LLM request.
    pub fn to_wire(&self) -> WireMessage {
        WireMessage {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

// ─────────────────────────────────────────────
// Sessions
// ─────────────────────────────────────────────

/// Stable session identifier.
///
/// Backed by a UUIDv7 string, so ids sort in creation order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Allocate a fresh, time-ordered id.
    pub fn generate() -> Self {
        SessionId(uuid::Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        SessionId(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        SessionId(s)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named conversation thread.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub active: bool,
}

impl Session {
    /// Create an empty, active session with the default title.
    pub fn new(default_title: &str) -> Self {
        let now = Utc::now();
        Session {
            id: SessionId::generate(),
            title: default_title.to_string(),
            created_at: now,
            updated_at: now,
            messages: Vec::new(),
            active: true,
        }
    }

    /// Number of user-authored messages.
    pub fn user_message_count(&self) -> usize {
        self.messages.iter().filter(|m| m.role == Role::User).count()
    }
}

// ─────────────────────────────────────────────
// Backend wire format
// ─────────────────────────────────────────────

/// `{role, content}` pair as the chat endpoint expects it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

/// Body of `POST /api/chat`.
#[derive(Clone, Debug, Serialize)]
pub struct ChatRequest {
    pub provider: String,
    pub api_key: String,
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub temperature: f64,
}

/// Successful `/api/chat` response.
#[derive(Clone, Debug, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Body of `POST /api/tts`.
#[derive(Clone, Debug, Serialize)]
pub struct SpeechRequest {
    pub text: String,
    pub voice: String,
    pub rate: f64,
    pub volume: f64,
    pub engine: String,
}

/// Form fields sent with `POST /api/asr`.
#[derive(Clone, Debug)]
pub struct TranscriptionRequest {
    pub engine: String,
    pub language: String,
    pub api_key: String,
}

/// Error body returned by every backend endpoint on non-2xx.
#[derive(Clone, Debug, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// `GET /api/status` response.
#[derive(Clone, Debug, Deserialize)]
pub struct BackendStatus {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub services: std::collections::HashMap<String, String>,
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
