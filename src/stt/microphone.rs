//! [`Transcriber`] over the live microphone and a Whisper engine.

use std::sync::mpsc::RecvTimeoutError;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::audio::vad::PhraseOutcome;
use crate::audio::{resample_to_16k, AudioSource, SourceError, SpeechGate};
use crate::config::ListenConfig;
use crate::stt::{whisper_language, ListenParams, SttEngine, TranscribeError, Transcriber};

/// Longest gap between two hardware buffers before the device is
/// considered stalled.
const FRAME_WAIT: Duration = Duration::from_secs(1);

pub struct MicrophoneTranscriber {
    source: Arc<Mutex<AudioSource>>,
    engine: Arc<dyn SttEngine>,
    energy_floor: f32,
    pause: Duration,
    phrase_limit: Duration,
}

impl MicrophoneTranscriber {
    pub fn new(source: AudioSource, engine: Arc<dyn SttEngine>, config: &ListenConfig) -> Self {
        Self {
            source: Arc::new(Mutex::new(source)),
            engine,
            energy_floor: config.energy_floor,
            pause: Duration::from_secs_f32(config.pause_secs.max(0.0)),
            phrase_limit: Duration::from_secs_f32(config.phrase_limit_secs.max(0.1)),
        }
    }

    fn gate(&self, params: &ListenParams) -> SpeechGate {
        SpeechGate {
            calibrate: params.adapt_duration,
            timeout: params.timeout,
            pause: self.pause,
            phrase_limit: self.phrase_limit,
            energy_floor: self.energy_floor,
        }
    }

    /// Drop stale audio, then run the gate on fresh frames.
    async fn capture(&self, gate: SpeechGate) -> Result<(PhraseOutcome, u32), TranscribeError> {
        let source = Arc::clone(&self.source);
        tokio::task::spawn_blocking(move || {
            let source = source
                .lock()
                .map_err(|_| TranscribeError::Service("audio source lock poisoned".into()))?;

            let stale = source.drain();
            if stale > 0 {
                log::debug!("dropped {stale} stale audio frame(s)");
            }

            let outcome = gate.record_phrase(source.sample_rate, || {
                match source.frames.recv_timeout(FRAME_WAIT) {
                    Ok(frame) => Ok(frame.samples),
                    Err(RecvTimeoutError::Timeout) => Err(SourceError::Stalled),
                    Err(RecvTimeoutError::Disconnected) => Err(SourceError::Disconnected),
                }
            });
            Ok((outcome, source.sample_rate))
        })
        .await
        .map_err(|e| TranscribeError::Service(format!("capture task failed: {e}")))?
    }
}

#[async_trait]
impl Transcriber for MicrophoneTranscriber {
    async fn listen(&self, params: &ListenParams) -> Result<String, TranscribeError> {
        log::debug!("listening (timeout {:?})", params.timeout);

        let (outcome, sample_rate) = self.capture(self.gate(params)).await?;
        let samples = match outcome {
            PhraseOutcome::Phrase(samples) => samples,
            PhraseOutcome::TimedOut => return Err(TranscribeError::TimedOut),
            PhraseOutcome::SourceLost(e) => return Err(TranscribeError::Service(e.to_string())),
        };

        let audio = prepare(&samples, sample_rate, self.energy_floor);
        if audio.is_empty() {
            return Err(TranscribeError::Unintelligible);
        }

        recognise(
            Arc::clone(&self.engine),
            audio,
            whisper_language(&params.language),
        )
        .await
    }
}

/// Resample a phrase to 16 kHz and cut its quiet edges.
fn prepare(samples: &[f32], sample_rate: u32, threshold: f32) -> Vec<f32> {
    let audio = resample_to_16k(samples, sample_rate);
    SpeechGate::trim_silence(&audio, threshold).to_vec()
}

/// Run the engine off the async runtime.
async fn recognise(
    engine: Arc<dyn SttEngine>,
    audio: Vec<f32>,
    language: Option<String>,
) -> Result<String, TranscribeError> {
    let text = tokio::task::spawn_blocking(move || engine.transcribe(&audio, language.as_deref()))
        .await
        .map_err(|e| TranscribeError::Service(format!("transcription task failed: {e}")))??;

    if text.trim().is_empty() {
        return Err(TranscribeError::Unintelligible);
    }
    log::info!("heard: {text}");
    Ok(text)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
