//! Energy-based voice activity detection.
//!
//! [`SpeechGate`] decides what part of the microphone stream is a phrase:
//!
//! 1. **Calibrate**: measure ambient RMS for a short while; the speech
//!    threshold is `max(floor, ambient × 1.5)`.
//! 2. **Wait**: until one frame rises above the threshold, or give up after
//!    the listen timeout.
//! 3. **Record**: until `pause` seconds of consecutive quiet frames or the
//!    phrase limit.
//!
//! Time is counted in samples, not wall-clock, so the gate behaves the same
//! whatever the hardware buffer size is.

use std::time::Duration;

/// Ambient RMS is scaled by this factor to get the speech threshold.
const AMBIENT_MARGIN: f32 = 1.5;

/// Frame size used by [`trim_silence`](SpeechGate::trim_silence): 30 ms at
/// 16 kHz.
const TRIM_FRAME: usize = 480;

/// Root-mean-square amplitude of `samples` (0.0 for an empty slice).
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}

// ---------------------------------------------------------------------------
// PhraseOutcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum PhraseOutcome {
    /// Mono samples at the source rate, from the first loud frame on.
    Phrase(Vec<f32>),
    /// Nobody spoke before the timeout.
    TimedOut,
    /// The source stopped delivering audio before a phrase started.
    SourceLost(SourceError),
}

/// Why a frame source gave no frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceError {
    /// No audio arrived within the frame wait.
    Stalled,
    /// The device stream is gone.
    Disconnected,
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Stalled => f.write_str("audio device stalled"),
            SourceError::Disconnected => f.write_str("audio device disconnected"),
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechGate
// ---------------------------------------------------------------------------

/// Listen settings, all durations in real time.
#[derive(Debug, Clone)]
pub struct SpeechGate {
    pub calibrate: Duration,
    pub timeout: Duration,
    pub pause: Duration,
    pub phrase_limit: Duration,
    /// Lowest threshold accepted, whatever the room sounds like.
    pub energy_floor: f32,
}

impl SpeechGate {
    /// Threshold for a room whose background level is `ambient_rms`.
    pub fn threshold_for(&self, ambient_rms: f32) -> f32 {
        (ambient_rms * AMBIENT_MARGIN).max(self.energy_floor)
    }

    /// Run calibrate → wait → record over frames pulled from `next_frame`.
    ///
    /// A source error before the phrase starts is reported as
    /// [`PhraseOutcome::SourceLost`]; during recording it ends the phrase.
    pub fn record_phrase(
        &self,
        sample_rate: u32,
        mut next_frame: impl FnMut() -> Result<Vec<f32>, SourceError>,
    ) -> PhraseOutcome {
        let samples_in = |d: Duration| (d.as_secs_f64() * sample_rate as f64) as usize;

        // ── Calibrate ─────────────────────────────────────────────────────
        let calibrate_len = samples_in(self.calibrate);
        let mut ambient = Vec::with_capacity(calibrate_len);
        while ambient.len() < calibrate_len {
            match next_frame() {
                Ok(frame) => ambient.extend_from_slice(&frame),
                Err(e) => return PhraseOutcome::SourceLost(e),
            }
        }
        let threshold = self.threshold_for(rms(&ambient));
        log::debug!("speech threshold {threshold:.4} (ambient {:.4})", rms(&ambient));

        // ── Wait for speech ───────────────────────────────────────────────
        let timeout_len = samples_in(self.timeout);
        let mut waited = 0;
        let mut phrase = loop {
            let frame = match next_frame() {
                Ok(frame) => frame,
                Err(e) => return PhraseOutcome::SourceLost(e),
            };
            if rms(&frame) > threshold {
                break frame;
            }
            waited += frame.len();
            if waited >= timeout_len {
                return PhraseOutcome::TimedOut;
            }
        };

        // ── Record ────────────────────────────────────────────────────────
        let pause_len = samples_in(self.pause);
        let limit_len = samples_in(self.phrase_limit);
        let mut quiet = 0;
        while quiet < pause_len && phrase.len() < limit_len {
            let Ok(frame) = next_frame() else { break };
            if rms(&frame) > threshold {
                quiet = 0;
            } else {
                quiet += frame.len();
            }
            phrase.extend_from_slice(&frame);
        }
        phrase.truncate(limit_len.max(1));

        PhraseOutcome::Phrase(phrase)
    }

    /// Cut leading and trailing 30 ms frames whose RMS is at or below
    /// `threshold`.  Returns a sub-slice; all-quiet input yields an empty one.
    pub fn trim_silence(audio: &[f32], threshold: f32) -> &[f32] {
        let loud = |i: &usize| {
            let start = i * TRIM_FRAME;
            let end = (start + TRIM_FRAME).min(audio.len());
            rms(&audio[start..end]) > threshold
        };
        let frames = audio.len().div_ceil(TRIM_FRAME);

        let Some(first) = (0..frames).find(loud) else {
            return &audio[0..0];
        };
        let last = (0..frames).rfind(loud).unwrap_or(first);

        &audio[first * TRIM_FRAME..((last + 1) * TRIM_FRAME).min(audio.len())]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// 1 kHz "device" delivering 10-sample frames (10 ms each).
    const RATE: u32 = 1_000;
    const FRAME: usize = 10;

    fn gate() -> SpeechGate {
        SpeechGate {
            calibrate: Duration::from_millis(50),
            timeout: Duration::from_millis(200),
            pause: Duration::from_millis(30),
            phrase_limit: Duration::from_secs(1),
            energy_floor: 0.01,
        }
    }

    /// Frames of the given amplitudes, then the device disconnects.
    fn source(levels: Vec<f32>) -> impl FnMut() -> Result<Vec<f32>, SourceError> {
        let mut frames = levels.into_iter();
        move || {
            frames
                .next()
                .map(|level| vec![level; FRAME])
                .ok_or(SourceError::Disconnected)
        }
    }

    fn quiet(n: usize) -> Vec<f32> {
        vec![0.001; n]
    }

    #[test]
    fn rms_of_constant_signal() {
        assert!((rms(&[0.5; 64]) - 0.5).abs() < 1e-6);
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn threshold_never_below_floor() {
        let g = gate();
        assert!((g.threshold_for(0.0) - 0.01).abs() < 1e-7);
        assert!((g.threshold_for(0.1) - 0.15).abs() < 1e-6);
    }

    #[test]
    fn records_until_pause() {
        // 5 calibration frames, 3 quiet, 4 loud, 3 quiet (= pause), 5 more.
        let mut levels = quiet(8);
        levels.extend([0.5; 4]);
        levels.extend(quiet(8));

        match gate().record_phrase(RATE, source(levels)) {
            PhraseOutcome::Phrase(samples) => assert_eq!(samples.len(), 7 * FRAME),
            other => panic!("expected a phrase, got {other:?}"),
        }
    }

    #[test]
    fn silence_times_out() {
        let outcome = gate().record_phrase(RATE, source(quiet(100)));
        assert_eq!(outcome, PhraseOutcome::TimedOut);
    }

    #[test]
    fn lost_source_is_not_a_timeout() {
        // Gone during calibration.
        assert_eq!(
            gate().record_phrase(RATE, source(vec![])),
            PhraseOutcome::SourceLost(SourceError::Disconnected)
        );
        // Gone while waiting for speech.
        assert_eq!(
            gate().record_phrase(RATE, source(quiet(7))),
            PhraseOutcome::SourceLost(SourceError::Disconnected)
        );
        // Stalled while waiting for speech.
        let mut frames = quiet(6).into_iter();
        let stalling = move || {
            frames
                .next()
                .map(|level| vec![level; FRAME])
                .ok_or(SourceError::Stalled)
        };
        assert_eq!(
            gate().record_phrase(RATE, stalling),
            PhraseOutcome::SourceLost(SourceError::Stalled)
        );
    }

    #[test]
    fn loud_room_raises_threshold() {
        // Ambient 0.2 → threshold 0.3: a 0.25 voice is not speech.
        let mut levels = vec![0.2; 5];
        levels.extend(vec![0.25; 30]);
        assert_eq!(gate().record_phrase(RATE, source(levels)), PhraseOutcome::TimedOut);
    }

    #[test]
    fn phrase_limit_caps_recording() {
        let mut levels = quiet(5);
        levels.extend(vec![0.5; 500]);
        match gate().record_phrase(RATE, source(levels)) {
            PhraseOutcome::Phrase(samples) => assert_eq!(samples.len(), 1_000),
            other => panic!("expected a phrase, got {other:?}"),
        }
    }

    #[test]
    fn source_ending_mid_phrase_keeps_audio() {
        let mut levels = quiet(5);
        levels.extend([0.5; 2]);
        match gate().record_phrase(RATE, source(levels)) {
            PhraseOutcome::Phrase(samples) => assert_eq!(samples.len(), 2 * FRAME),
            other => panic!("expected a phrase, got {other:?}"),
        }
    }

    #[test]
    fn trim_cuts_quiet_edges() {
        let mut audio = vec![0.0_f32; 480];
        audio.extend(vec![0.5_f32; 480]);
        audio.extend(vec![0.0_f32; 480]);
        assert_eq!(SpeechGate::trim_silence(&audio, 0.01).len(), 480);
    }

    #[test]
    fn trim_all_quiet_is_empty() {
        assert!(SpeechGate::trim_silence(&[0.0; 1_440], 0.01).is_empty());
        assert!(SpeechGate::trim_silence(&[], 0.01).is_empty());
    }

    #[test]
    fn trim_keeps_loud_signal() {
        let audio = vec![0.5_f32; 1_000];
        assert_eq!(SpeechGate::trim_silence(&audio, 0.01).len(), 1_000);
    }
}
