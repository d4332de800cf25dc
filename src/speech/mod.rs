//! Spoken replies.
//!
//! * [`Speaker`]: async trait to say a text out loud, optionally keeping a
//!   copy of the audio.
//! * [`TtsSpeaker`]: Google Translate TTS rendered to MP3 and played with
//!   an external player.
//! * [`archive::unique_path`]: never overwrite a saved reply.

pub mod archive;
pub mod gtts;

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

pub use gtts::TtsSpeaker;

// ---------------------------------------------------------------------------
// SpeechError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("speech synthesis request failed: {0}")]
    Request(String),

    #[error("speech synthesis timed out")]
    Timeout,

    #[error("speech endpoint returned {status}")]
    Status { status: u16 },

    #[error("nothing to say")]
    EmptyText,

    #[error("audio player failed: {0}")]
    Player(String),

    #[error("audio file error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for SpeechError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SpeechError::Timeout
        } else {
            SpeechError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Speaker trait
// ---------------------------------------------------------------------------

/// Text-to-speech output.
#[async_trait]
pub trait Speaker: Send + Sync {
    /// Speak `text` and return once playback has finished.
    ///
    /// When `save_as` is given the audio is also written there, or next to
    /// it under a numbered name if the file already exists.
    async fn speak(&self, text: &str, save_as: Option<&Path>) -> Result<(), SpeechError>;
}

// ---------------------------------------------------------------------------
// RecordingSpeaker  (test-only)
// ---------------------------------------------------------------------------

/// Test double remembering every spoken text.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingSpeaker {
    spoken: std::sync::Mutex<Vec<String>>,
    fail: bool,
}

#[cfg(test)]
impl RecordingSpeaker {
    pub fn failing() -> Self {
        Self {
            spoken: std::sync::Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl Speaker for RecordingSpeaker {
    async fn speak(&self, text: &str, _save_as: Option<&Path>) -> Result<(), SpeechError> {
        self.spoken.lock().unwrap().push(text.to_string());
        if self.fail {
            return Err(SpeechError::Player("no audio device".into()));
        }
        Ok(())
    }
}
