//! Configuration loading
//!
//! `config.toml` next to the binary, every field defaulted so an empty or
//! missing file just works. A file that fails to parse is reported and
//! replaced with defaults rather than aborting startup.

use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub typing: TypingConfig,
    #[serde(default)]
    pub hotkey: HotkeyConfigSection,
    #[serde(default)]
    pub lexicon: LexiconConfig,
}

// ============================================================================
// Engine
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct EngineConfig {
    /// Path to the whisper ggml model file.
    #[serde(default = "default_model_path")]
    pub model_path: String,
    /// Language hint for the engine ("en", "fr", ...). None lets the model
    /// decide.
    #[serde(default)]
    pub language: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            language: None,
        }
    }
}

fn default_model_path() -> String {
    "models/ggml-base.en.bin".into()
}

// ============================================================================
// Audio
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    /// Frame length handed to the engine, in milliseconds.
    #[serde(default = "default_frame_ms")]
    pub frame_ms: u32,
    /// Silence run that finalizes an utterance.
    #[serde(default = "default_silence_ms")]
    pub silence_ms: u32,
    /// Hard cap on utterance length.
    #[serde(default = "default_max_utterance_secs")]
    pub max_utterance_secs: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            frame_ms: default_frame_ms(),
            silence_ms: default_silence_ms(),
            max_utterance_secs: default_max_utterance_secs(),
        }
    }
}

fn default_frame_ms() -> u32 {
    30
}

fn default_silence_ms() -> u32 {
    500
}

fn default_max_utterance_secs() -> u32 {
    30
}

// ============================================================================
// Typing
// ============================================================================

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TypingMethod {
    /// Native text input (default).
    #[default]
    Direct,
    /// Clipboard set + paste.
    Clipboard,
}

#[derive(Debug, Deserialize, Default)]
pub struct TypingConfig {
    #[serde(default)]
    pub method: TypingMethod,
}

// ============================================================================
// Hotkey
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct HotkeyConfigSection {
    #[serde(default = "default_hotkey_enabled")]
    pub enabled: bool,
    /// Maximum gap between taps for the double-tap toggle (ms).
    #[serde(default = "default_double_tap_ms")]
    pub double_tap_ms: u64,
}

impl Default for HotkeyConfigSection {
    fn default() -> Self {
        Self {
            enabled: default_hotkey_enabled(),
            double_tap_ms: default_double_tap_ms(),
        }
    }
}

fn default_hotkey_enabled() -> bool {
    true
}

fn default_double_tap_ms() -> u64 {
    400
}

// ============================================================================
// Lexicon extras
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct LexiconConfig {
    /// User phrases typed as literal text, e.g.
    /// `[[lexicon.extra]] phrase = "my email" text = "me@example.com"`.
    /// Registered after the built-ins, so built-ins keep their meaning.
    #[serde(default)]
    pub extra: Vec<ExtraPhrase>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtraPhrase {
    pub phrase: String,
    pub text: String,
}

impl Config {
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Config::default();
        }
        match fs::read_to_string(path) {
            Ok(raw) => match toml::from_str(&raw) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "bad config, using defaults");
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable config, using defaults");
                Config::default()
            }
        }
    }
}
