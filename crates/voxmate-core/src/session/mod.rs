//! Conversation sessions: durable store plus the lifecycle manager.
//!
//! # Disk format
//!
//! Two versioned JSON records under the data directory (`~/.voxmate/`):
//! - `sessions.json`: `{"version": 1, "sessions": [...]}`, newest first, at most 20
//! - `settings.json`: `{"version": 1, "settings": {...}}`

pub mod manager;
pub mod store;

pub use manager::{generate_title, SessionManager, DEFAULT_TITLE};
pub use store::{SessionStore, MAX_SESSIONS};
