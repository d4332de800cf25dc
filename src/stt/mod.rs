//! Listening: turn the next spoken phrase into text.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                 Transcriber (async trait)                 │
//! │                                                           │
//! │   ┌──────────────┐  frames  ┌────────────┐  16 kHz  ┌────┐ │
//! │   │ AudioSource  │─────────▶│ SpeechGate │────────▶│ Stt│ │
//! │   │ (cpal, once) │          │ wait/record│         │ Eng│ │
//! │   └──────────────┘          └────────────┘         └────┘ │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! Timeouts and unintelligible audio are ordinary outcomes, reported as
//! [`TranscribeError::TimedOut`] and [`TranscribeError::Unintelligible`].

pub mod engine;
pub mod microphone;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::ListenConfig;

pub use engine::{whisper_language, SttEngine, SttError, WhisperEngine};
pub use microphone::MicrophoneTranscriber;

#[cfg(test)]
pub use engine::MockSttEngine;

// ---------------------------------------------------------------------------
// TranscribeError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum TranscribeError {
    /// Nobody spoke within the listen timeout.
    #[error("no speech before the listen timeout")]
    TimedOut,

    /// Something was heard but no words came out of it.
    #[error("speech could not be understood")]
    Unintelligible,

    /// The recogniser itself failed.
    #[error("speech recognition failed: {0}")]
    Service(String),
}

impl From<SttError> for TranscribeError {
    fn from(e: SttError) -> Self {
        TranscribeError::Service(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// ListenParams
// ---------------------------------------------------------------------------

/// Per-listen inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct ListenParams {
    /// Ambient-noise sampling before listening.
    pub adapt_duration: Duration,
    /// BCP-47 tag of the expected language, or `"auto"`.
    pub language: String,
    /// How long to wait for speech to start.
    pub timeout: Duration,
}

impl From<&ListenConfig> for ListenParams {
    fn from(config: &ListenConfig) -> Self {
        Self {
            adapt_duration: Duration::from_secs_f32(config.adapt_duration_secs.max(0.0)),
            language: config.language.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

// ---------------------------------------------------------------------------
// Transcriber trait
// ---------------------------------------------------------------------------

/// Speech input.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Wait for the next phrase and return its text.
    async fn listen(&self, params: &ListenParams) -> Result<String, TranscribeError>;
}

// ---------------------------------------------------------------------------
// ScriptedTranscriber  (test-only)
// ---------------------------------------------------------------------------

/// Plays back a fixed list of listen results.
///
/// Once the script is exhausted `listen` never returns; the optional
/// `finished` sender fires at that point so a test can stop the loop.
#[cfg(test)]
pub struct ScriptedTranscriber {
    script: std::sync::Mutex<std::collections::VecDeque<Result<String, TranscribeError>>>,
    finished: std::sync::Mutex<Option<tokio::sync::oneshot::Sender<()>>>,
}

#[cfg(test)]
impl ScriptedTranscriber {
    pub fn new(script: Vec<Result<String, TranscribeError>>) -> Self {
        Self {
            script: std::sync::Mutex::new(script.into()),
            finished: std::sync::Mutex::new(None),
        }
    }

    /// Receiver completing when the script runs out.
    pub fn on_finished(&self) -> tokio::sync::oneshot::Receiver<()> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        *self.finished.lock().unwrap() = Some(tx);
        rx
    }

    /// Results not yet handed out.
    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

#[cfg(test)]
#[async_trait]
impl Transcriber for ScriptedTranscriber {
    async fn listen(&self, _params: &ListenParams) -> Result<String, TranscribeError> {
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            None => {
                let finished = self.finished.lock().unwrap().take();
                if let Some(tx) = finished {
                    let _ = tx.send(());
                }
                std::future::pending().await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_follow_config() {
        let config = ListenConfig {
            timeout_secs: 7,
            adapt_duration_secs: 0.25,
            language: "fr-FR".into(),
            ..ListenConfig::default()
        };
        let params = ListenParams::from(&config);
        assert_eq!(params.timeout, Duration::from_secs(7));
        assert_eq!(params.adapt_duration, Duration::from_millis(250));
        assert_eq!(params.language, "fr-FR");
    }

    #[test]
    fn engine_failures_are_service_errors() {
        let err = TranscribeError::from(SttError::Transcription("boom".into()));
        assert!(matches!(err, TranscribeError::Service(msg) if msg.contains("boom")));
    }

    #[tokio::test]
    async fn script_plays_in_order_then_signals() {
        let t = ScriptedTranscriber::new(vec![
            Ok("one".into()),
            Err(TranscribeError::TimedOut),
        ]);
        let done = t.on_finished();
        let params = ListenParams::from(&ListenConfig::default());

        assert_eq!(t.listen(&params).await.unwrap(), "one");
        assert!(matches!(t.listen(&params).await, Err(TranscribeError::TimedOut)));

        let pending = tokio::time::timeout(Duration::from_millis(20), t.listen(&params)).await;
        assert!(pending.is_err(), "exhausted script must not return");
        done.await.unwrap();
    }
}
