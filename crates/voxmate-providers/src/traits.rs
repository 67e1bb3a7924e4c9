//! Collaborator traits: the seams between the pipeline and the backend.
//!
//! The HTTP clients in this crate implement them; the pipeline only sees
//! the traits, so tests can swap in scripted collaborators.

use async_trait::async_trait;
use voxmate_core::types::{ChatRequest, SpeechRequest};
use voxmate_core::VoxResult;

/// Something that turns a conversation into the next assistant reply.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send the full ordered history and return the reply text.
    ///
    /// Non-2xx → `Status`, transport failure → `Network`,
    /// unusable body → `Payload`. Never retries.
    async fn chat(&self, request: &ChatRequest) -> VoxResult<String>;

    /// Display name for logging.
    fn display_name(&self) -> &str;
}

/// Something that turns text into playable audio bytes.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `request.text`. A zero-length result is a `Payload` error.
    async fn synthesize(&self, request: &SpeechRequest) -> VoxResult<Vec<u8>>;

    /// Display name for logging.
    fn display_name(&self) -> &str;
}
