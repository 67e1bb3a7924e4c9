//! Speech-text cleanup: what the synthesizer will actually read aloud.
//!
//! Links, addresses, tokens, markup and code fences read terribly, so they
//! are stripped before synthesis. `voxmate preview` shows the result.

use std::sync::LazyLock;

use regex::Regex;

/// Longest text sent to the synthesizer before `"..."` is appended.
pub const MAX_SPEECH_CHARS: usize = 200;
/// Below this many characters the cleaned text is considered useless.
const MIN_SPEECH_CHARS: usize = 5;
/// Length of the fallback cut when cleaning removed nearly everything.
const FALLBACK_CHARS: usize = 100;
/// Spoken when nothing at all is left.
pub const EMPTY_FALLBACK: &str = "Done";

struct Patterns {
    url: Regex,
    email: Regex,
    long_token: Regex,
    key_value: Regex,
    html_tag: Regex,
    code_fence: Regex,
    inline_code: Regex,
    whitespace: Regex,
    symbols: Regex,
}

static PATTERNS: LazyLock<Patterns> = LazyLock::new(|| {
    let re = |p: &str| Regex::new(p).expect("Invalid speech-text regex");
    Patterns {
        url: re(r"https?://\S+"),
        email: re(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b"),
        long_token: re(r"\b[A-Za-z0-9]{30,}\b"),
        key_value: re(r"\b\w+=\S+"),
        html_tag: re(r"<[^>]+>"),
        code_fence: re(r"```\w*\n?"),
        inline_code: re(r"`([^`]*)`"),
        whitespace: re(r"\s+"),
        symbols: re(r"[`<>{}\[\]$]+"),
    }
});

/// Clean `text` for speech synthesis.
pub fn clean_for_speech(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let p = &*PATTERNS;

    let mut cleaned = p.url.replace_all(text, "").into_owned();
    cleaned = p.email.replace_all(&cleaned, "").into_owned();
    cleaned = p.long_token.replace_all(&cleaned, "").into_owned();
    cleaned = p.key_value.replace_all(&cleaned, "").into_owned();
    cleaned = p.html_tag.replace_all(&cleaned, "").into_owned();
    cleaned = p.code_fence.replace_all(&cleaned, "").into_owned();
    cleaned = p.inline_code.replace_all(&cleaned, "$1").into_owned();
    cleaned = p.whitespace.replace_all(&cleaned, " ").trim().to_string();

    if cleaned.chars().count() < MIN_SPEECH_CHARS {
        let stripped = p.symbols.replace_all(text, "");
        let fallback = p.whitespace.replace_all(&stripped, " ").trim().to_string();
        cleaned = if fallback.is_empty() {
            EMPTY_FALLBACK.to_string()
        } else {
            fallback.chars().take(FALLBACK_CHARS).collect()
        };
    }

    if cleaned.chars().count() > MAX_SPEECH_CHARS {
        let head: String = cleaned.chars().take(MAX_SPEECH_CHARS).collect();
        cleaned = format!("{head}...");
    }

    cleaned
}
