//! Backend collaborators for Voxmate.
//!
//! # Architecture
//!
//! - [`traits::ChatProvider`] / [`traits::SpeechSynthesizer`]: what the pipeline calls
//! - [`transcription::TranscriptionProvider`]: speech-to-text
//! - [`http_provider`]: shared reqwest plumbing + `/api/chat` client
//! - [`speech`], [`transcription`], [`health`]: `/api/tts`, `/api/asr`, `/api/status`
//! - [`registry`]: providers, engines, voices, settings validation
//! - [`speech_text`]: text cleanup before synthesis

pub mod health;
pub mod http_provider;
pub mod registry;
pub mod speech;
pub mod speech_text;
pub mod traits;
pub mod transcription;

// Re-export main types for convenience
pub use health::check_status;
pub use http_provider::{BackendClient, HttpChatClient};
pub use registry::{validate_settings, ProviderSpec, ValidationReport, PROVIDERS};
pub use speech::HttpSpeechClient;
pub use speech_text::clean_for_speech;
pub use traits::{ChatProvider, SpeechSynthesizer};
pub use transcription::{HttpTranscriber, TranscriptionProvider};
