//! Durable storage for the session collection and the settings record.
//!
//! Two JSON records live in the data directory:
//! - `sessions.json`: `{"version":1,"sessions":[...]}`, most-recent-first, at most 20
//! - `settings.json`: `{"version":1,"settings":{...}}`
//!
//! Unversioned records written by the legacy front end (a bare session
//! array with `timestamp`/`isActive`, or a bare settings object) are
//! migrated on load. Anything unreadable is discarded with a warning.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{VoxError, VoxResult};
use crate::settings::Settings;
use crate::types::Session;
use crate::utils;

/// Storage key of the session collection.
pub const SESSIONS_KEY: &str = "sessions";
/// Storage key of the settings record.
pub const SETTINGS_KEY: &str = "settings";
/// Most sessions ever persisted.
pub const MAX_SESSIONS: usize = 20;
/// Current snapshot schema version.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SessionsRecordRef<'a> {
    version: u32,
    sessions: &'a [Session],
}

#[derive(Deserialize)]
struct SessionsRecord {
    #[allow(dead_code)]
    version: u32,
    sessions: Vec<Session>,
}

#[derive(Serialize)]
struct SettingsRecordRef<'a> {
    version: u32,
    settings: &'a Settings,
}

#[derive(Deserialize)]
struct SettingsRecord {
    #[allow(dead_code)]
    version: u32,
    settings: Settings,
}

/// Export document produced by [`SessionStore::export`].
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportDocument<'a> {
    timestamp: String,
    total_sessions: usize,
    sessions: &'a [Session],
    settings: Settings,
}

/// File-backed store. Cloning is cheap; every clone writes the same files.
#[derive(Clone, Debug)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        SessionStore { dir: dir.into() }
    }

    /// Store rooted at `~/.voxmate/`.
    pub fn open_default() -> Self {
        Self::new(utils::get_data_path())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    // ── sessions ──

    /// Load the session collection, or an empty one if it is missing or
    /// unreadable.
    pub fn load(&self) -> Vec<Session> {
        match self.try_load() {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!(error = %e, "discarding unreadable session snapshot");
                Vec::new()
            }
        }
    }

    /// Like [`load`](Self::load) but reports why a snapshot was rejected.
    pub fn try_load(&self) -> VoxResult<Vec<Session>> {
        let Some(raw) = self.read_record(SESSIONS_KEY)? else {
            return Ok(Vec::new());
        };

        let migrated = migrate_sessions(raw)?;
        let record: SessionsRecord = serde_json::from_value(migrated)
            .map_err(|e| VoxError::Persistence(format!("bad session snapshot: {e}")))?;

        let mut sessions = record.sessions;
        sessions.truncate(MAX_SESSIONS);
        debug!(count = sessions.len(), "loaded sessions");
        Ok(sessions)
    }

    /// Persist the first [`MAX_SESSIONS`] sessions, write-through.
    pub fn save(&self, sessions: &[Session]) -> VoxResult<()> {
        let kept = &sessions[..sessions.len().min(MAX_SESSIONS)];
        let record = SessionsRecordRef {
            version: SNAPSHOT_VERSION,
            sessions: kept,
        };
        let json = serde_json::to_string(&record)
            .map_err(|e| VoxError::Persistence(e.to_string()))?;
        self.write_record(SESSIONS_KEY, &json)?;
        debug!(count = kept.len(), "saved sessions");
        Ok(())
    }

    // ── settings ──

    /// Load settings, falling back to defaults.
    pub fn load_settings(&self) -> Settings {
        match self.try_load_settings() {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "discarding unreadable settings, using defaults");
                Settings::default()
            }
        }
    }

    fn try_load_settings(&self) -> VoxResult<Settings> {
        let Some(raw) = self.read_record(SETTINGS_KEY)? else {
            return Ok(Settings::default());
        };

        let migrated = migrate_settings(raw)?;
        let record: SettingsRecord = serde_json::from_value(migrated)
            .map_err(|e| VoxError::Persistence(format!("bad settings snapshot: {e}")))?;
        Ok(record.settings)
    }

    pub fn save_settings(&self, settings: &Settings) -> VoxResult<()> {
        let record = SettingsRecordRef {
            version: SNAPSHOT_VERSION,
            settings,
        };
        let json = serde_json::to_string(&record)
            .map_err(|e| VoxError::Persistence(e.to_string()))?;
        self.write_record(SETTINGS_KEY, &json)
    }

    /// Forget saved settings and return the defaults.
    pub fn reset_settings(&self) -> VoxResult<Settings> {
        let path = self.record_path(SETTINGS_KEY);
        if path.exists() {
            std::fs::remove_file(&path)?;
            debug!("removed {}", path.display());
        }
        Ok(Settings::default())
    }

    // ── export ──

    /// Pretty JSON export of every session plus settings, API key masked.
    pub fn export(&self, sessions: &[Session], settings: &Settings) -> VoxResult<String> {
        let doc = ExportDocument {
            timestamp: Utc::now().to_rfc3339(),
            total_sessions: sessions.len(),
            sessions,
            settings: settings.redacted(),
        };
        serde_json::to_string_pretty(&doc).map_err(|e| VoxError::Persistence(e.to_string()))
    }

    // ── raw record io ──

    fn read_record(&self, key: &str) -> VoxResult<Option<Value>> {
        let path = self.record_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        let value = serde_json::from_str(&content)
            .map_err(|e| VoxError::Persistence(format!("{}: {e}", path.display())))?;
        Ok(Some(value))
    }

    /// Write to a sibling temp file, then rename over the record.
    fn write_record(&self, key: &str, json: &str) -> VoxResult<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.record_path(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

// ─────────────────────────────────────────────
// Migrations
// ─────────────────────────────────────────────

fn check_version(obj: &serde_json::Map<String, Value>) -> VoxResult<()> {
    match obj.get("version").and_then(Value::as_u64) {
        Some(v) if v <= u64::from(SNAPSHOT_VERSION) => Ok(()),
        Some(v) => Err(VoxError::Persistence(format!(
            "snapshot version {v} is newer than supported {SNAPSHOT_VERSION}"
        ))),
        None => Err(VoxError::Persistence("snapshot version is not a number".into())),
    }
}

/// Bring a raw sessions record up to the current envelope.
fn migrate_sessions(raw: Value) -> VoxResult<Value> {
    match raw {
        Value::Array(items) => {
            debug!(count = items.len(), "migrating legacy session array");
            let sessions: Vec<Value> = items.into_iter().map(migrate_legacy_session).collect();
            Ok(serde_json::json!({ "version": SNAPSHOT_VERSION, "sessions": sessions }))
        }
        Value::Object(obj) if obj.contains_key("version") => {
            check_version(&obj)?;
            Ok(Value::Object(obj))
        }
        _ => Err(VoxError::Persistence(
            "session snapshot is neither an envelope nor a legacy array".into(),
        )),
    }
}

/// `{id, title, timestamp, messages, isActive}` → current session shape.
fn migrate_legacy_session(mut item: Value) -> Value {
    if let Some(obj) = item.as_object_mut() {
        if let Some(ts) = obj.remove("timestamp") {
            obj.entry("createdAt").or_insert_with(|| ts.clone());
            obj.entry("updatedAt").or_insert(ts);
        }
        if let Some(active) = obj.remove("isActive") {
            obj.entry("active").or_insert(active);
        }
        if let Some(Value::Number(n)) = obj.get("id") {
            let id = n.to_string();
            obj.insert("id".into(), Value::String(id));
        }
    }
    item
}

/// Bring a raw settings record up to the current envelope.
fn migrate_settings(raw: Value) -> VoxResult<Value> {
    match raw {
        Value::Object(obj) if obj.contains_key("version") && obj.contains_key("settings") => {
            check_version(&obj)?;
            Ok(Value::Object(obj))
        }
        Value::Object(flat) => {
            debug!("migrating legacy flat settings");
            Ok(serde_json::json!({ "version": SNAPSHOT_VERSION, "settings": flat }))
        }
        _ => Err(VoxError::Persistence("settings snapshot is not an object".into())),
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Message, Role};
    use tempfile::tempdir;

    fn make_session(title: &str, active: bool) -> Session {
        let mut s = Session::new("New conversation");
        s.title = title.to_string();
        s.active = active;
        s.messages.push(Message::user(title));
        s.messages.push(Message::assistant("ok"));
        s
    }

    #[test]
    fn test_load_missing_is_empty() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_round_trip_is_field_for_field() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let sessions = vec![make_session("b", true), make_session("a", false)];

        store.save(&sessions).unwrap();
        assert_eq!(store.load(), sessions);
    }

    #[test]
    fn test_save_caps_at_twenty() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let sessions: Vec<Session> = (0..25)
            .map(|i| make_session(&format!("s{i}"), i == 0))
            .collect();

        store.save(&sessions).unwrap();
        let loaded = store.load();
        assert_eq!(loaded.len(), MAX_SESSIONS);
        assert_eq!(loaded[0].title, "s0");
        assert_eq!(loaded[19].title, "s19");
    }

    #[test]
    fn test_corrupt_snapshot_discarded() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("sessions.json"), "{not json").unwrap();
        let store = SessionStore::new(dir.path());

        assert!(store.try_load().is_err());
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_future_version_discarded() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("sessions.json"),
            r#"{"version": 99, "sessions": []}"#,
        )
        .unwrap();
        let store = SessionStore::new(dir.path());

        let err = store.try_load().unwrap_err();
        assert!(err.to_string().contains("newer"));
    }

    #[test]
    fn test_legacy_array_migrates() {
        let dir = tempdir().unwrap();
        let legacy = r#"[
            {"id": "1717000000000", "title": "Weather today", "timestamp": "2024-05-29T16:26:40Z",
             "isActive": true,
             "messages": [
                {"role": "user", "content": "Weather today", "timestamp": "2024-05-29T16:26:40Z"},
                {"role": "assistant", "content": "Sunny", "timestamp": "2024-05-29T16:26:42Z"}
             ]},
            {"id": 1716000000000, "title": "Old", "timestamp": "2024-05-18T02:40:00Z",
             "isActive": false, "messages": []}
        ]"#;
        std::fs::write(dir.path().join("sessions.json"), legacy).unwrap();
        let store = SessionStore::new(dir.path());

        let sessions = store.try_load().unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id.as_str(), "1717000000000");
        assert!(sessions[0].active);
        assert_eq!(sessions[0].created_at, sessions[0].updated_at);
        assert_eq!(sessions[0].messages[1].role, Role::Assistant);
        assert_eq!(sessions[1].id.as_str(), "1716000000000");
        assert!(!sessions[1].active);
    }

    #[test]
    fn test_save_writes_envelope_and_no_temp_file() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        store.save(&[make_session("x", true)]).unwrap();

        let raw: Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("sessions.json")).unwrap())
                .unwrap();
        assert_eq!(raw["version"], 1);
        assert_eq!(raw["sessions"].as_array().unwrap().len(), 1);
        assert!(!dir.path().join("sessions.json.tmp").exists());
    }

    #[test]
    fn test_settings_round_trip_and_reset() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        assert_eq!(store.load_settings(), Settings::default());

        let mut settings = Settings::default();
        settings.set("llmProvider", "kimi").unwrap();
        settings.set("enableTTS", "false").unwrap();
        store.save_settings(&settings).unwrap();
        assert_eq!(store.load_settings(), settings);

        let reset = store.reset_settings().unwrap();
        assert_eq!(reset, Settings::default());
        assert_eq!(store.load_settings(), Settings::default());
    }

    #[test]
    fn test_legacy_flat_settings_migrate() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("settings.json"),
            r#"{"llmProvider": "kimi", "modelName": "moonshot-v1-32k", "enableTTS": false}"#,
        )
        .unwrap();
        let store = SessionStore::new(dir.path());

        let settings = store.load_settings();
        assert_eq!(settings.llm_provider, "kimi");
        assert_eq!(settings.model_name, "moonshot-v1-32k");
        assert!(!settings.enable_tts);
        assert_eq!(settings.voice_select, "zh-CN-XiaoxiaoNeural");
    }

    #[test]
    fn test_corrupt_settings_fall_back() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("settings.json"), "[1,2,3]").unwrap();
        let store = SessionStore::new(dir.path());
        assert_eq!(store.load_settings(), Settings::default());
    }

    #[test]
    fn test_export_masks_api_key() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let mut settings = Settings::default();
        settings.api_key = "sk-abcdefghijklmnop".into();

        let doc = store.export(&[make_session("x", true)], &settings).unwrap();
        let json: Value = serde_json::from_str(&doc).unwrap();
        assert_eq!(json["totalSessions"], 1);
        assert_eq!(json["settings"]["apiKey"], "sk-abcde...mnop");
        assert!(!doc.contains("sk-abcdefghijklmnop"));
    }
}
