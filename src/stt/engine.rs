//! Whisper speech-to-text engine.
//!
//! [`SttEngine`] is object-safe and `Send + Sync` so it can be shared behind
//! an `Arc<dyn SttEngine>` and called from a blocking worker.
//! [`WhisperEngine`] wraps a `whisper_rs::WhisperContext`; a fresh
//! `WhisperState` is created per call.

use std::path::Path;

use thiserror::Error;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::audio::resample::WHISPER_SAMPLE_RATE;

// ---------------------------------------------------------------------------
// SttError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Error)]
pub enum SttError {
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Whisper context initialisation failed: {0}")]
    ContextInit(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    /// More than 60 s of audio at 16 kHz.
    #[error("Audio too long: maximum 60 s")]
    AudioTooLong,
}

// ---------------------------------------------------------------------------
// SttEngine trait
// ---------------------------------------------------------------------------

/// Speech-to-text over **16 kHz mono f32** PCM.
pub trait SttEngine: Send + Sync {
    /// `language` is an ISO-639-1 code, `None` to auto-detect.  Returns the
    /// trimmed transcript, empty when nothing intelligible was said.
    fn transcribe(&self, audio: &[f32], language: Option<&str>) -> Result<String, SttError>;
}

/// Whisper refuses clips shorter than one second; shorter phrases are
/// padded with silence.
const MIN_AUDIO_SAMPLES: usize = WHISPER_SAMPLE_RATE as usize;
const MAX_AUDIO_SAMPLES: usize = 60 * WHISPER_SAMPLE_RATE as usize;

/// Map a BCP-47 tag to the Whisper language code.
///
/// `"en-US"` → `Some("en")`, `"fr"` → `Some("fr")`, `"auto"`/empty → `None`.
pub fn whisper_language(tag: &str) -> Option<String> {
    let primary = tag.trim().split(['-', '_']).next().unwrap_or_default();
    if primary.is_empty() || primary.eq_ignore_ascii_case("auto") {
        None
    } else {
        Some(primary.to_ascii_lowercase())
    }
}

/// Whisper marks non-speech with bracketed tags (`[BLANK_AUDIO]`,
/// `(wind blowing)`).  Those alone are not a transcript.
fn clean_transcript(raw: &str) -> String {
    let text = raw.trim();
    let is_tag = |open: char, close: char| text.starts_with(open) && text.ends_with(close);
    if is_tag('[', ']') || is_tag('(', ')') {
        String::new()
    } else {
        text.to_string()
    }
}

// ---------------------------------------------------------------------------
// WhisperEngine
// ---------------------------------------------------------------------------

pub struct WhisperEngine {
    ctx: WhisperContext,
    n_threads: i32,
}

impl std::fmt::Debug for WhisperEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperEngine")
            .field("n_threads", &self.n_threads)
            .finish_non_exhaustive()
    }
}

// SAFETY: WhisperContext is Send+Sync as declared by whisper-rs; the model
// weights are read-only after loading.
unsafe impl Send for WhisperEngine {}
unsafe impl Sync for WhisperEngine {}

impl WhisperEngine {
    /// Load a GGML model from `model_path`.
    ///
    /// # Errors
    ///
    /// - [`SttError::ModelNotFound`]: `model_path` does not exist.
    /// - [`SttError::ContextInit`] : whisper-rs failed to load the file.
    pub fn load(model_path: impl AsRef<Path>) -> Result<Self, SttError> {
        let path = model_path.as_ref();

        if !path.exists() {
            return Err(SttError::ModelNotFound(path.display().to_string()));
        }

        let path_str = path.to_str().ok_or_else(|| {
            SttError::ModelNotFound(format!(
                "model path contains non-UTF-8 characters: {}",
                path.display()
            ))
        })?;

        let ctx = WhisperContext::new_with_params(path_str, WhisperContextParameters::default())
            .map_err(|e| SttError::ContextInit(e.to_string()))?;

        log::info!("whisper model loaded from {}", path.display());
        Ok(Self {
            ctx,
            n_threads: optimal_threads(),
        })
    }
}

impl SttEngine for WhisperEngine {
    fn transcribe(&self, audio: &[f32], language: Option<&str>) -> Result<String, SttError> {
        if audio.len() > MAX_AUDIO_SAMPLES {
            return Err(SttError::AudioTooLong);
        }
        let mut padded;
        let audio = if audio.len() < MIN_AUDIO_SAMPLES {
            padded = audio.to_vec();
            padded.resize(MIN_AUDIO_SAMPLES, 0.0);
            &padded[..]
        } else {
            audio
        };

        let mut fp = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        fp.set_language(language);
        fp.set_n_threads(self.n_threads);
        fp.set_print_progress(false);
        fp.set_print_realtime(false);
        fp.set_print_special(false);

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| SttError::ContextInit(e.to_string()))?;

        let started = std::time::Instant::now();
        state
            .full(fp, audio)
            .map_err(|e| SttError::Transcription(e.to_string()))?;

        let n_segments = state
            .full_n_segments()
            .map_err(|e| SttError::Transcription(e.to_string()))?;

        let mut text = String::new();
        for i in 0..n_segments {
            let segment = state
                .full_get_segment_text(i)
                .map_err(|e| SttError::Transcription(format!("segment {i}: {e}")))?;
            text.push_str(&segment);
        }

        log::debug!(
            "whisper: {n_segments} segment(s) in {} ms",
            started.elapsed().as_millis()
        );
        Ok(clean_transcript(&text))
    }
}

/// CPU threads for inference, capped at 8.
fn optimal_threads() -> i32 {
    std::thread::available_parallelism()
        .map(|n| n.get().min(8) as i32)
        .unwrap_or(4)
}

// ---------------------------------------------------------------------------
// MockSttEngine  (test-only)
// ---------------------------------------------------------------------------

/// Returns a pre-configured response and records the language it was asked
/// for.
#[cfg(test)]
pub struct MockSttEngine {
    response: Result<String, SttError>,
    languages: std::sync::Mutex<Vec<Option<String>>>,
}

#[cfg(test)]
impl MockSttEngine {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            response: Ok(text.into()),
            languages: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn err(error: SttError) -> Self {
        Self {
            response: Err(error),
            languages: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn languages(&self) -> Vec<Option<String>> {
        self.languages.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl SttEngine for MockSttEngine {
    fn transcribe(&self, _audio: &[f32], language: Option<&str>) -> Result<String, SttError> {
        self.languages
            .lock()
            .unwrap()
            .push(language.map(str::to_string));
        self.response.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
