//! Configuration schema.
//!
//! Hierarchy: `Config` → `BackendConfig`, `StorageConfig`, `StatusConfig`,
//! `PlaybackConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration: loaded from `~/.voxmate/config.json` + env vars.
///
/// Machine-level plumbing only. User preferences (provider, voice, rate)
/// live in the settings record next to the sessions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub backend: BackendConfig,
    pub storage: StorageConfig,
    pub status: StatusConfig,
    pub playback: PlaybackConfig,
}

// ─────────────────────────────────────────────
// Backend
// ─────────────────────────────────────────────

/// Where the chat/speech backend lives.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackendConfig {
    /// Base URL; `/api/chat`, `/api/tts`, `/api/asr`, `/api/status` hang off it.
    pub api_base: String,
    /// Timeout for `/api/chat`.
    pub chat_timeout_secs: u64,
    /// Timeout for `/api/tts` and `/api/asr`.
    pub speech_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:5000".to_string(),
            chat_timeout_secs: 30,
            speech_timeout_secs: 60,
        }
    }
}

impl BackendConfig {
    pub fn chat_timeout(&self) -> Duration {
        Duration::from_secs(self.chat_timeout_secs)
    }

    pub fn speech_timeout(&self) -> Duration {
        Duration::from_secs(self.speech_timeout_secs)
    }
}

// ─────────────────────────────────────────────
// Storage
// ─────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageConfig {
    /// Directory holding `sessions.json` and `settings.json`. `~` is expanded.
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.voxmate".to_string(),
        }
    }
}

impl StorageConfig {
    /// The data directory with `~` expanded.
    pub fn data_path(&self) -> PathBuf {
        crate::utils::expand_home(&self.data_dir)
    }
}

// ─────────────────────────────────────────────
// Status indicators
// ─────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusConfig {
    /// How long an `active` indicator stays lit, in milliseconds.
    pub clear_delay_ms: u64,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            clear_delay_ms: 1000,
        }
    }
}

impl StatusConfig {
    pub fn clear_delay(&self) -> Duration {
        Duration::from_millis(self.clear_delay_ms)
    }
}

// ─────────────────────────────────────────────
// Playback
// ─────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaybackConfig {
    /// External player command, e.g. `"ffplay -nodisp -autoexit"`.
    /// The audio file path is appended as the last argument.
    /// Auto-detected when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.backend.api_base, "http://127.0.0.1:5000");
        assert_eq!(config.backend.chat_timeout(), Duration::from_secs(30));
        assert_eq!(config.backend.speech_timeout(), Duration::from_secs(60));
        assert_eq!(config.status.clear_delay(), Duration::from_secs(1));
        assert!(config.playback.command.is_none());
        assert!(config.storage.data_path().ends_with(".voxmate"));
    }

    #[test]
    fn test_camel_case_round_trip() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert!(json["backend"].get("apiBase").is_some());
        assert!(json["backend"].get("chatTimeoutSecs").is_some());
        assert!(json["status"].get("clearDelayMs").is_some());
        assert!(json["playback"].get("command").is_none());

        let back: Config = serde_json::from_value(json).unwrap();
        assert_eq!(back, Config::default());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"backend":{"apiBase":"http://10.0.0.2:8080"}}"#).unwrap();
        assert_eq!(config.backend.api_base, "http://10.0.0.2:8080");
        assert_eq!(config.backend.chat_timeout_secs, 30);
        assert_eq!(config.storage, StorageConfig::default());
    }
}
