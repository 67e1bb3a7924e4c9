//! Voice transcription: speech-to-text via the backend's `/api/asr`.
//!
//! The audio goes up as a multipart file part named `audio`, alongside the
//! `engine`, `language` and `api_key` form fields. The reply is `{"text"}`.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error};

use voxmate_core::types::TranscriptionRequest;
use voxmate_core::{VoxError, VoxResult};

use crate::http_provider::{status_error, transport_error, BackendClient};

// ─────────────────────────────────────────────
// Trait
// ─────────────────────────────────────────────

/// Trait for speech-to-text transcription providers.
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    /// Transcribe a recorded clip to text.
    ///
    /// `file_name` is only a hint for the backend's format sniffing.
    async fn transcribe(
        &self,
        audio: &[u8],
        file_name: &str,
        request: &TranscriptionRequest,
    ) -> VoxResult<String>;

    /// Display name for logging.
    fn display_name(&self) -> &str;
}

// ─────────────────────────────────────────────
// Backend ASR
// ─────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct HttpTranscriber {
    backend: BackendClient,
}

impl HttpTranscriber {
    pub fn new(api_base: &str, timeout: Duration) -> VoxResult<Self> {
        Ok(HttpTranscriber {
            backend: BackendClient::new(api_base, timeout)?,
        })
    }
}

#[async_trait]
impl TranscriptionProvider for HttpTranscriber {
    async fn transcribe(
        &self,
        audio: &[u8],
        file_name: &str,
        request: &TranscriptionRequest,
    ) -> VoxResult<String> {
        if audio.is_empty() {
            return Err(VoxError::Payload("empty recording".into()));
        }

        debug!(
            bytes = audio.len(),
            engine = %request.engine,
            language = %request.language,
            "transcribing audio"
        );

        let file_part = reqwest::multipart::Part::bytes(audio.to_vec())
            .file_name(file_name.to_string())
            .mime_str(audio_mime(file_name))
            .map_err(|e| VoxError::Payload(format!("bad audio part: {e}")))?;

        let form = reqwest::multipart::Form::new()
            .text("engine", request.engine.clone())
            .text("language", request.language.clone())
            .text("api_key", request.api_key.clone())
            .part("audio", file_part);

        let response = self
            .backend
            .http()
            .post(self.backend.url("/api/asr"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport_error("/api/asr", e))?;

        if !response.status().is_success() {
            return Err(status_error("/api/asr", response).await);
        }

        let json: serde_json::Value = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse transcription response");
            VoxError::Payload(format!("unreadable transcription response: {e}"))
        })?;
        let text = json["text"]
            .as_str()
            .ok_or_else(|| VoxError::Payload("transcription response has no text".into()))?
            .trim()
            .to_string();

        debug!(chars = text.chars().count(), "transcription complete");
        Ok(text)
    }

    fn display_name(&self) -> &str {
        "backend ASR"
    }
}

// ─────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────

/// Check if a file path looks like an audio file.
pub fn is_audio_file(path: &str) -> bool {
    let lower = path.to_lowercase();
    [
        ".ogg", ".oga", ".opus", ".mp3", ".m4a", ".wav", ".flac", ".aac", ".webm",
    ]
    .iter()
    .any(|ext| lower.ends_with(ext))
}

/// MIME type for an audio file name, by extension.
pub fn audio_mime(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("ogg") | Some("oga") | Some("opus") => "audio/ogg",
        Some("webm") => "audio/webm",
        Some("m4a") | Some("aac") => "audio/mp4",
        Some("flac") => "audio/flac",
        _ => "application/octet-stream",
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
