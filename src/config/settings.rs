//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.
//! Every section is `#[serde(default)]`, so a settings file only needs the
//! keys it wants to change.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// ModelFailureReply
// ---------------------------------------------------------------------------

/// What the assistant says when the chat model fails to answer a query.
///
/// | Variant     | Spoken text                                              |
/// |-------------|----------------------------------------------------------|
/// | `Apology`   | `SessionConfig::apology`                                 |
/// | `ErrorText` | the error description, e.g. "An error occurred while …" |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFailureReply {
    #[default]
    Apology,
    ErrorText,
}

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Wake/sleep phrases and the assistant persona.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Substring that activates a dormant session (case-insensitive).
    pub wake_phrase: String,
    /// Substring that puts an active session back to sleep (case-insensitive).
    pub sleep_phrase: String,
    /// Name the assistant introduces itself with in the system prompt.
    pub assistant_name: String,
    /// Location mentioned in the system prompt.
    pub location: String,
    /// Whether queries may be augmented with a web search.
    pub allow_web_search: bool,
    /// Reply policy when the chat model fails.
    pub failure_reply: ModelFailureReply,
    /// Spoken when `failure_reply` is `Apology`.
    pub apology: String,
    /// When set, every spoken reply is also saved as an MP3 in this
    /// directory.
    pub archive_dir: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            wake_phrase: "hey assistant".into(),
            sleep_phrase: "goodbye".into(),
            assistant_name: "Assistant".into(),
            location: "Paris - France".into(),
            allow_web_search: true,
            failure_reply: ModelFailureReply::default(),
            apology: "Sorry, I could not answer that right now.".into(),
            archive_dir: None,
        }
    }
}

// ---------------------------------------------------------------------------
// ListenConfig
// ---------------------------------------------------------------------------

/// Microphone listening and Whisper transcription settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    /// Seconds to wait for speech to start before reporting a timeout.
    pub timeout_secs: u64,
    /// Seconds of ambient noise sampled before each listen to calibrate the
    /// speech threshold.
    pub adapt_duration_secs: f32,
    /// BCP-47 language tag of the speaker (e.g. `"en-US"`), or `"auto"`.
    pub language: String,
    /// Lowest RMS level accepted as speech, whatever the calibration says.
    pub energy_floor: f32,
    /// Seconds of silence that end a phrase.
    pub pause_secs: f32,
    /// Hard cap on the length of one phrase, in seconds.
    pub phrase_limit_secs: f32,
    /// Whisper GGML model file.
    pub model_path: PathBuf,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            adapt_duration_secs: 0.5,
            language: "en-US".into(),
            energy_floor: 0.012,
            pause_secs: 0.8,
            phrase_limit_secs: 30.0,
            model_path: AppPaths::new().models_dir.join("ggml-base.bin"),
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

/// Text-to-speech and playback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Language of the synthesised voice (ISO-639-1, e.g. `"en"`).
    pub language: String,
    /// Regional accent, expressed as the Google top-level domain
    /// (`"us"`, `"co.uk"`, `"com.au"`, …).
    pub region: String,
    /// External MP3 player used for replies and cues.
    pub player: String,
    /// Seconds to wait for the synthesis endpoint.
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            language: "en".into(),
            region: "us".into(),
            player: "mpg123".into(),
            timeout_secs: 15,
        }
    }
}

// ---------------------------------------------------------------------------
// LlmConfig
// ---------------------------------------------------------------------------

/// Settings for the conversational model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API.
    ///
    /// - OpenAI: `https://api.openai.com`
    /// - Ollama: `http://localhost:11434`
    pub base_url: String,
    /// API key: `None` for local providers.
    pub api_key: Option<String>,
    /// Model identifier sent to the API (e.g. `"gpt-4o-mini"`).
    pub model: String,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f32,
    /// Maximum seconds to wait for a completion.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".into(),
            api_key: None,
            model: "gpt-4o-mini".into(),
            temperature: 0.7,
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// SearchConfig
// ---------------------------------------------------------------------------

/// SerpApi web search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Master switch; when off no search provider is built at all.
    pub enabled: bool,
    pub api_key: Option<String>,
    pub base_url: String,
    /// Interface language of the results (`hl`).
    pub language: String,
    /// Country the search is run from (`gl`).
    pub country: String,
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            base_url: "https://serpapi.com".into(),
            language: "en".into(),
            country: "fr".into(),
            timeout_secs: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// IndicatorConfig
// ---------------------------------------------------------------------------

/// GPIO indicator lights.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// Drive the LEDs at all.  Off on machines without GPIO.
    pub enabled: bool,
    /// Lit while the assistant is listening for a query.
    pub listening_pin: u32,
    /// Lit while a reply is being spoken.
    pub speaking_pin: u32,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listening_pin: 24,
            speaking_pin: 25,
        }
    }
}

// ---------------------------------------------------------------------------
// CueConfig
// ---------------------------------------------------------------------------

/// Short sounds played on state changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CueConfig {
    pub enabled: bool,
    /// Directory the cue file names below are resolved against.
    pub dir: PathBuf,
    pub activated: String,
    pub ready: String,
    pub deactivated: String,
    pub acknowledged: String,
}

impl Default for CueConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from("sounds"),
            activated: "sound1.mp3".into(),
            ready: "sound1.mp3".into(),
            deactivated: "sound2.mp3".into(),
            acknowledged: "sound3.mp3".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingConfig
// ---------------------------------------------------------------------------

/// Console verbosity and the optional log file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Console level: `error`, `warn`, `info`, `debug` or `trace`.
    pub level: String,
    /// Log file receiving every record at `debug` and above.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            file: Some(PathBuf::from("assistant.log")),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use vocal_assistant::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub session: SessionConfig,
    pub listen: ListenConfig,
    pub speech: SpeechConfig,
    pub llm: LlmConfig,
    pub search: SearchConfig,
    pub indicator: IndicatorConfig,
    pub cues: CueConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Write the configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
