//! Config loader: reads `~/.voxmate/config.json`, merges env vars, and
//! applies legacy migrations.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.voxmate/config.json`
//! 3. Environment variables `VOXMATE_<SECTION>__<FIELD>` (override JSON)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::Config;
use crate::error::{VoxError, VoxResult};

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    apply_env_overrides(load_config_from_path(&config_path))
}

/// Load config from a specific file path, without env overrides.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return Config::default();
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return Config::default();
        }
    };

    // Parse JSON → Value first for migration
    let mut raw: serde_json::Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return Config::default();
        }
    };

    migrate_config(&mut raw);

    match serde_json::from_value(raw) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to deserialize config: {}", e);
            Config::default()
        }
    }
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> VoxResult<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| VoxError::Config(format!("cannot encode config: {e}")))?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply legacy config migrations.
///
/// Moves `backend.url` → `backend.apiBase` unless the new key is present.
fn migrate_config(raw: &mut serde_json::Value) {
    let Some(backend) = raw.get_mut("backend").and_then(|b| b.as_object_mut()) else {
        return;
    };
    if let Some(url) = backend.remove("url") {
        if !backend.contains_key("apiBase") {
            backend.insert("apiBase".to_string(), url);
            debug!("Migrated backend.url → backend.apiBase");
        }
    }
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `VOXMATE_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `VOXMATE_BACKEND__API_BASE` → `backend.api_base`
/// - `VOXMATE_BACKEND__CHAT_TIMEOUT_SECS` → `backend.chat_timeout_secs`
/// - `VOXMATE_BACKEND__SPEECH_TIMEOUT_SECS` → `backend.speech_timeout_secs`
/// - `VOXMATE_STORAGE__DATA_DIR` → `storage.data_dir`
/// - `VOXMATE_STATUS__CLEAR_DELAY_MS` → `status.clear_delay_ms`
/// - `VOXMATE_PLAYBACK__COMMAND` → `playback.command`
fn apply_env_overrides(config: Config) -> Config {
    apply_overrides_from(config, |name| std::env::var(name).ok())
}

fn apply_overrides_from(mut config: Config, var: impl Fn(&str) -> Option<String>) -> Config {
    if let Some(val) = var("VOXMATE_BACKEND__API_BASE") {
        config.backend.api_base = val;
    }
    if let Some(n) = parse_var(&var, "VOXMATE_BACKEND__CHAT_TIMEOUT_SECS") {
        config.backend.chat_timeout_secs = n;
    }
    if let Some(n) = parse_var(&var, "VOXMATE_BACKEND__SPEECH_TIMEOUT_SECS") {
        config.backend.speech_timeout_secs = n;
    }
    if let Some(val) = var("VOXMATE_STORAGE__DATA_DIR") {
        config.storage.data_dir = val;
    }
    if let Some(n) = parse_var(&var, "VOXMATE_STATUS__CLEAR_DELAY_MS") {
        config.status.clear_delay_ms = n;
    }
    if let Some(val) = var("VOXMATE_PLAYBACK__COMMAND") {
        config.playback.command = Some(val).filter(|v| !v.trim().is_empty());
    }
    config
}

fn parse_var(var: &impl Fn(&str) -> Option<String>, name: &str) -> Option<u64> {
    let raw = var(name)?;
    match raw.trim().parse::<u64>() {
        Ok(n) => Some(n),
        Err(_) => {
            warn!("Ignoring {}: '{}' is not a whole number", name, raw);
            None
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp_json(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_load_missing_file() {
        let config = load_config_from_path(Path::new("/nonexistent/path/config.json"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_valid_json() {
        let file = write_temp_json(
            r#"{
            "backend": { "apiBase": "http://voice.local:5000", "chatTimeoutSecs": 10 },
            "playback": { "command": "mpv --really-quiet" }
        }"#,
        );

        let config = load_config_from_path(file.path());
        assert_eq!(config.backend.api_base, "http://voice.local:5000");
        assert_eq!(config.backend.chat_timeout_secs, 10);
        // Default preserved
        assert_eq!(config.backend.speech_timeout_secs, 60);
        assert_eq!(config.playback.command.as_deref(), Some("mpv --really-quiet"));
    }

    #[test]
    fn test_load_invalid_json_returns_defaults() {
        let file = write_temp_json("not valid json {{{");
        assert_eq!(load_config_from_path(file.path()), Config::default());
    }

    #[test]
    fn test_load_wrong_types_returns_defaults() {
        let file = write_temp_json(r#"{"status": {"clearDelayMs": "soon"}}"#);
        assert_eq!(load_config_from_path(file.path()), Config::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.backend.api_base = "http://10.1.1.1:5000".to_string();
        config.status.clear_delay_ms = 250;

        save_config(&config, Some(&path)).unwrap();
        assert_eq!(load_config_from_path(&path), config);
    }

    #[test]
    fn test_migrate_backend_url() {
        let file = write_temp_json(r#"{"backend": {"url": "http://old-host:5000"}}"#);
        let config = load_config_from_path(file.path());
        assert_eq!(config.backend.api_base, "http://old-host:5000");
    }

    #[test]
    fn test_migrate_no_overwrite() {
        let file = write_temp_json(
            r#"{"backend": {"url": "http://old-host:5000", "apiBase": "http://new-host:5000"}}"#,
        );
        let config = load_config_from_path(file.path());
        assert_eq!(config.backend.api_base, "http://new-host:5000");
    }

    #[test]
    fn test_env_overrides() {
        let config = apply_overrides_from(
            Config::default(),
            env(&[
                ("VOXMATE_BACKEND__API_BASE", "http://env-host:9000"),
                ("VOXMATE_BACKEND__SPEECH_TIMEOUT_SECS", "5"),
                ("VOXMATE_STORAGE__DATA_DIR", "/tmp/voxmate-data"),
                ("VOXMATE_STATUS__CLEAR_DELAY_MS", "400"),
                ("VOXMATE_PLAYBACK__COMMAND", "afplay"),
            ]),
        );
        assert_eq!(config.backend.api_base, "http://env-host:9000");
        assert_eq!(config.backend.speech_timeout_secs, 5);
        assert_eq!(config.storage.data_dir, "/tmp/voxmate-data");
        assert_eq!(config.status.clear_delay_ms, 400);
        assert_eq!(config.playback.command.as_deref(), Some("afplay"));
    }

    #[test]
    fn test_env_override_bad_number_ignored() {
        let config = apply_overrides_from(
            Config::default(),
            env(&[("VOXMATE_BACKEND__CHAT_TIMEOUT_SECS", "forever")]),
        );
        assert_eq!(config.backend.chat_timeout_secs, 30);
    }

    #[test]
    fn test_env_blank_player_means_autodetect() {
        let config =
            apply_overrides_from(Config::default(), env(&[("VOXMATE_PLAYBACK__COMMAND", "  ")]));
        assert!(config.playback.command.is_none());
    }

    #[test]
    fn test_saved_json_uses_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        save_config(&Config::default(), Some(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert!(raw["backend"].get("speechTimeoutSecs").is_some());
        assert!(raw["backend"].get("speech_timeout_secs").is_none());
        assert!(raw["storage"].get("dataDir").is_some());
    }
}
