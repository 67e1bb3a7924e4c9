//! Provider registry: static specs for the chat providers, speech
//! engines, voices, and recognition engines the backend supports.
//!
//! Also the settings validator: the same checks the backend applies before
//! accepting a request, so the CLI can flag a bad setting up front.

use voxmate_core::settings::{Settings, MAX_SPEECH_VOLUME, MIN_SPEECH_VOLUME};

// ─────────────────────────────────────────────
// Chat providers
// ─────────────────────────────────────────────

/// Static specification describing one chat provider.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    /// Internal name sent as `provider` (e.g. `"deepseek"`).
    pub name: &'static str,
    /// Human-readable name for logs. E.g. `"Moonshot Kimi"`.
    pub display_name: &'static str,
    /// Models the backend accepts for this provider. First is the default.
    pub models: &'static [&'static str],
}

impl ProviderSpec {
    pub fn default_model(&self) -> &'static str {
        self.models.first().copied().unwrap_or_default()
    }

    pub fn offers(&self, model: &str) -> bool {
        self.models.contains(&model)
    }
}

pub static PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        name: "deepseek",
        display_name: "DeepSeek",
        models: &["DeepSeek-V3"],
    },
    ProviderSpec {
        name: "kimi",
        display_name: "Moonshot Kimi",
        models: &["moonshot-v1-8k", "moonshot-v1-32k", "moonshot-v1-128k"],
    },
];

/// Find a provider spec by its internal name.
pub fn find_provider(name: &str) -> Option<&'static ProviderSpec> {
    PROVIDERS.iter().find(|p| p.name == name)
}

// ─────────────────────────────────────────────
// Speech engines & voices
// ─────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct VoiceSpec {
    pub id: &'static str,
    pub label: &'static str,
}

#[derive(Clone, Debug)]
pub struct EngineSpec {
    pub name: &'static str,
    pub display_name: &'static str,
}

pub static TTS_ENGINES: &[EngineSpec] = &[
    EngineSpec {
        name: "edge",
        display_name: "Microsoft Edge TTS",
    },
    EngineSpec {
        name: "azure",
        display_name: "Azure Cognitive Services",
    },
];

/// Neural voices offered by both speech engines.
pub static VOICES: &[VoiceSpec] = &[
    VoiceSpec { id: "zh-CN-XiaoxiaoNeural", label: "Xiaoxiao (female)" },
    VoiceSpec { id: "zh-CN-YunxiNeural", label: "Yunxi (male)" },
    VoiceSpec { id: "zh-CN-YunyangNeural", label: "Yunyang (male)" },
    VoiceSpec { id: "zh-CN-XiaoyiNeural", label: "Xiaoyi (female)" },
    VoiceSpec { id: "zh-CN-YunjianNeural", label: "Yunjian (male)" },
    VoiceSpec { id: "zh-CN-XiaochenNeural", label: "Xiaochen (female)" },
    VoiceSpec { id: "zh-CN-XiaohanNeural", label: "Xiaohan (female)" },
    VoiceSpec { id: "zh-CN-XiaomengNeural", label: "Xiaomeng (female)" },
    VoiceSpec { id: "zh-CN-XiaomoNeural", label: "Xiaomo (female)" },
    VoiceSpec { id: "zh-CN-XiaoqiuNeural", label: "Xiaoqiu (female)" },
    VoiceSpec { id: "zh-CN-XiaoruiNeural", label: "Xiaorui (female)" },
    VoiceSpec { id: "zh-CN-XiaoshuangNeural", label: "Xiaoshuang (female)" },
    VoiceSpec { id: "zh-CN-XiaoxuanNeural", label: "Xiaoxuan (female)" },
    VoiceSpec { id: "zh-CN-XiaoyanNeural", label: "Xiaoyan (female)" },
    VoiceSpec { id: "zh-CN-XiaoyouNeural", label: "Xiaoyou (female)" },
    VoiceSpec { id: "zh-CN-XiaozhenNeural", label: "Xiaozhen (female)" },
    VoiceSpec { id: "zh-CN-YunfengNeural", label: "Yunfeng (male)" },
    VoiceSpec { id: "zh-CN-YunhaoNeural", label: "Yunhao (male)" },
    VoiceSpec { id: "zh-CN-YunjieNeural", label: "Yunjie (male)" },
    VoiceSpec { id: "zh-CN-YunxiaNeural", label: "Yunxia (male)" },
    VoiceSpec { id: "zh-CN-YunyeNeural", label: "Yunye (male)" },
    VoiceSpec { id: "zh-CN-YunzeNeural", label: "Yunze (male)" },
];

pub fn find_engine(name: &str) -> Option<&'static EngineSpec> {
    TTS_ENGINES.iter().find(|e| e.name == name)
}

/// Voices available for a speech engine; empty for unknown engines.
pub fn voices_for(engine: &str) -> &'static [VoiceSpec] {
    if find_engine(engine).is_some() {
        VOICES
    } else {
        &[]
    }
}

/// Accepted speech rate range.
pub const SPEECH_RATE_RANGE: (f64, f64) = (0.5, 2.0);

// ─────────────────────────────────────────────
// Recognition engines & languages
// ─────────────────────────────────────────────

pub static ASR_ENGINES: &[EngineSpec] = &[
    EngineSpec {
        name: "browser",
        display_name: "Built-in recognizer",
    },
    EngineSpec {
        name: "whisper",
        display_name: "Whisper",
    },
];

pub static ASR_LANGUAGES: &[(&str, &str)] = &[
    ("zh-CN", "Chinese"),
    ("en-US", "English"),
    ("ja-JP", "Japanese"),
    ("ko-KR", "Korean"),
];

// ─────────────────────────────────────────────
// Validation
// ─────────────────────────────────────────────

/// Outcome of [`validate_settings`]. Errors block a request; warnings don't.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check settings against the registry.
pub fn validate_settings(settings: &Settings) -> ValidationReport {
    let mut report = ValidationReport::default();

    // Chat
    match find_provider(&settings.llm_provider) {
        None => report
            .errors
            .push(format!("unsupported provider: {}", settings.llm_provider)),
        Some(spec) if !spec.offers(&settings.model_name) => report.errors.push(format!(
            "model '{}' is not offered by provider '{}'",
            settings.model_name, settings.llm_provider
        )),
        Some(_) => {}
    }

    let key = settings.api_key.trim();
    if key.is_empty() {
        report.errors.push("API key must not be empty".to_string());
    } else if key.chars().count() < 10 {
        report
            .warnings
            .push("API key looks too short".to_string());
    }

    // Speech
    if find_engine(&settings.tts_engine).is_none() {
        report
            .errors
            .push(format!("unsupported speech engine: {}", settings.tts_engine));
    }
    if !voices_for(&settings.tts_engine)
        .iter()
        .any(|v| v.id == settings.voice_select)
    {
        report
            .warnings
            .push(format!("voice {} may not be supported", settings.voice_select));
    }
    let (min_rate, max_rate) = SPEECH_RATE_RANGE;
    if !(min_rate..=max_rate).contains(&settings.speech_rate) {
        report
            .errors
            .push(format!("speech rate must be between {min_rate} and {max_rate}"));
    }
    if !(MIN_SPEECH_VOLUME..=MAX_SPEECH_VOLUME).contains(&settings.speech_volume) {
        report.errors.push(format!(
            "speech volume must be between {MIN_SPEECH_VOLUME} and {MAX_SPEECH_VOLUME}"
        ));
    }

    // Recognition
    if !ASR_ENGINES.iter().any(|e| e.name == settings.asr_engine) {
        report
            .errors
            .push(format!("unsupported recognition engine: {}", settings.asr_engine));
    }
    if !ASR_LANGUAGES
        .iter()
        .any(|(code, _)| *code == settings.asr_language)
    {
        report
            .warnings
            .push(format!("language {} may not be supported", settings.asr_language));
    }

    report
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_settings() -> Settings {
        Settings {
            api_key: "sk-0123456789abcdef".into(),
            ..Settings::default()
        }
    }

    #[test]
    fn test_find_provider() {
        let spec = find_provider("kimi").unwrap();
        assert_eq!(spec.default_model(), "moonshot-v1-8k");
        assert!(spec.offers("moonshot-v1-128k"));
        assert!(find_provider("openai").is_none());
    }

    #[test]
    fn test_voices_for_engines() {
        assert_eq!(voices_for("edge").len(), 22);
        assert_eq!(voices_for("azure").len(), 22);
        assert!(voices_for("festival").is_empty());
    }

    #[test]
    fn test_all_voices_unique() {
        let mut ids: Vec<&str> = VOICES.iter().map(|v| v.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), VOICES.len(), "Duplicate voice ids found");
    }

    #[test]
    fn test_default_settings_except_key_are_valid() {
        let report = validate_settings(&valid_settings());
        assert!(report.is_valid(), "{:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_empty_key_is_error() {
        let report = validate_settings(&Settings::default());
        assert!(!report.is_valid());
        assert!(report.errors.iter().any(|e| e.contains("API key")));
    }

    #[test]
    fn test_short_key_is_warning() {
        let settings = Settings {
            api_key: "sk-123".into(),
            ..Settings::default()
        };
        let report = validate_settings(&settings);
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_model_must_match_provider() {
        let settings = Settings {
            llm_provider: "kimi".into(),
            ..valid_settings()
        };
        let report = validate_settings(&settings);
        assert!(report.errors.iter().any(|e| e.contains("DeepSeek-V3")));
    }

    #[test]
    fn test_rate_and_volume_ranges() {
        let settings = Settings {
            speech_rate: 2.5,
            speech_volume: 0.2,
            ..valid_settings()
        };
        let report = validate_settings(&settings);
        assert_eq!(report.errors.len(), 2);

        let edge = Settings {
            speech_rate: 0.5,
            speech_volume: 1.5,
            ..valid_settings()
        };
        assert!(validate_settings(&edge).is_valid());
    }

    #[test]
    fn test_unknown_voice_and_language_warn() {
        let settings = Settings {
            voice_select: "en-US-JennyNeural".into(),
            asr_language: "fr-FR".into(),
            ..valid_settings()
        };
        let report = validate_settings(&settings);
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn test_unknown_engines_are_errors() {
        let settings = Settings {
            tts_engine: "festival".into(),
            asr_engine: "vosk".into(),
            ..valid_settings()
        };
        let report = validate_settings(&settings);
        assert_eq!(report.errors.len(), 2);
    }
}
