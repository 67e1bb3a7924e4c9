//! User-facing settings record.
//!
//! Persisted next to the sessions as a flat camelCase object. Unknown keys
//! are ignored and missing keys fall back to [`Settings::default`], so a
//! record written by an older build still loads.

use serde::{Deserialize, Serialize};

use crate::error::{VoxError, VoxResult};

/// Lowest accepted speech volume.
pub const MIN_SPEECH_VOLUME: f64 = 0.5;
/// Highest accepted speech volume.
pub const MAX_SPEECH_VOLUME: f64 = 1.5;

/// Every key [`Settings::set`] accepts, in display order.
pub const SETTING_KEYS: &[&str] = &[
    "llmProvider",
    "apiKey",
    "modelName",
    "temperature",
    "ttsEngine",
    "voiceSelect",
    "speechRate",
    "speechVolume",
    "asrEngine",
    "asrLanguage",
    "asrSensitivity",
    "enableTTS",
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub llm_provider: String,
    pub api_key: String,
    pub model_name: String,
    pub temperature: f64,
    pub tts_engine: String,
    pub voice_select: String,
    pub speech_rate: f64,
    pub speech_volume: f64,
    pub asr_engine: String,
    pub asr_language: String,
    pub asr_sensitivity: f64,
    #[serde(rename = "enableTTS")]
    pub enable_tts: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            llm_provider: "deepseek".to_string(),
            api_key: String::new(),
            model_name: "DeepSeek-V3".to_string(),
            temperature: 0.6,
            tts_engine: "edge".to_string(),
            voice_select: "zh-CN-XiaoxiaoNeural".to_string(),
            speech_rate: 1.0,
            speech_volume: 1.0,
            asr_engine: "browser".to_string(),
            asr_language: "zh-CN".to_string(),
            asr_sensitivity: 5.0,
            enable_tts: true,
        }
    }
}

impl Settings {
    /// Update one setting by its persisted key.
    ///
    /// Numeric keys are parsed as floats; `speechVolume` is clamped into
    /// `[0.5, 1.5]`. `enableTTS` accepts `true/false/1/0/on/off`.
    pub fn set(&mut self, key: &str, value: &str) -> VoxResult<()> {
        let value = value.trim();
        match key {
            "llmProvider" => self.llm_provider = value.to_string(),
            "apiKey" => self.api_key = value.to_string(),
            "modelName" => self.model_name = value.to_string(),
            "temperature" => self.temperature = parse_number(key, value)?,
            "ttsEngine" => self.tts_engine = value.to_string(),
            "voiceSelect" => self.voice_select = value.to_string(),
            "speechRate" => self.speech_rate = parse_number(key, value)?,
            "speechVolume" => {
                self.speech_volume =
                    parse_number(key, value)?.clamp(MIN_SPEECH_VOLUME, MAX_SPEECH_VOLUME)
            }
            "asrEngine" => self.asr_engine = value.to_string(),
            "asrLanguage" => self.asr_language = value.to_string(),
            "asrSensitivity" => self.asr_sensitivity = parse_number(key, value)?,
            "enableTTS" => {
                self.enable_tts = match value.to_lowercase().as_str() {
                    "true" | "1" | "on" | "yes" => true,
                    "false" | "0" | "off" | "no" => false,
                    _ => {
                        return Err(VoxError::Config(format!(
                            "enableTTS expects true/false, got '{value}'"
                        )))
                    }
                }
            }
            _ => return Err(VoxError::Config(format!("unknown setting '{key}'"))),
        }
        Ok(())
    }

    /// Read one setting by its persisted key, formatted for display.
    ///
    /// The API key is masked.
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "llmProvider" => self.llm_provider.clone(),
            "apiKey" => mask_api_key(&self.api_key),
            "modelName" => self.model_name.clone(),
            "temperature" => self.temperature.to_string(),
            "ttsEngine" => self.tts_engine.clone(),
            "voiceSelect" => self.voice_select.clone(),
            "speechRate" => self.speech_rate.to_string(),
            "speechVolume" => self.speech_volume.to_string(),
            "asrEngine" => self.asr_engine.clone(),
            "asrLanguage" => self.asr_language.clone(),
            "asrSensitivity" => self.asr_sensitivity.to_string(),
            "enableTTS" => self.enable_tts.to_string(),
            _ => return None,
        };
        Some(value)
    }

    /// Copy with the API key masked, for export and display.
    pub fn redacted(&self) -> Settings {
        Settings {
            api_key: mask_api_key(&self.api_key),
            ..self.clone()
        }
    }
}

fn parse_number(key: &str, value: &str) -> VoxResult<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| VoxError::Config(format!("{key} expects a number, got '{value}'")))
}

/// Mask an API key for logs: `abcd1234...wxyz`, or `***` when short.
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 12 {
        let head: String = chars[..8].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else if chars.is_empty() {
        String::new()
    } else {
        "***".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_keys() {
        let settings: Settings =
            serde_json::from_str(r#"{"llmProvider":"kimi","speechRate":1.5}"#).unwrap();
        assert_eq!(settings.llm_provider, "kimi");
        assert_eq!(settings.speech_rate, 1.5);
        assert_eq!(settings.model_name, "DeepSeek-V3");
        assert!(settings.enable_tts);
    }

    #[test]
    fn test_enable_tts_key_name() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(json["enableTTS"], true);
        assert_eq!(json["voiceSelect"], "zh-CN-XiaoxiaoNeural");
    }

    #[test]
    fn test_set_clamps_volume() {
        let mut settings = Settings::default();
        settings.set("speechVolume", "3").unwrap();
        assert_eq!(settings.speech_volume, MAX_SPEECH_VOLUME);
        settings.set("speechVolume", "0.1").unwrap();
        assert_eq!(settings.speech_volume, MIN_SPEECH_VOLUME);
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut settings = Settings::default();
        assert!(settings.set("temperature", "warm").is_err());
        assert!(settings.set("enableTTS", "maybe").is_err());
        assert!(settings.set("colour", "blue").is_err());
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_set_and_get_every_key() {
        let mut settings = Settings::default();
        for key in SETTING_KEYS {
            assert!(settings.get(key).is_some(), "missing getter for {key}");
        }
        settings.set("enableTTS", "off").unwrap();
        assert_eq!(settings.get("enableTTS").as_deref(), Some("false"));
    }

    #[test]
    fn test_mask_api_key() {
        assert_eq!(mask_api_key("sk-1234567890abcdef"), "sk-12345...cdef");
        assert_eq!(mask_api_key("short"), "***");
        assert_eq!(mask_api_key(""), "");
    }
}
