//! Microphone audio: capture, level detection and Whisper preparation.
//!
//! # Pipeline
//!
//! ```text
//! Microphone → cpal callback → downmix → AudioFrame (mpsc)
//!           → SpeechGate (calibrate / wait / record) → resample_to_16k
//!           → trim_silence → Whisper
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use vocal_assistant::audio::open_default_input;
//!
//! let (_handle, source) = open_default_input().unwrap(); // drop handle → stops stream
//!
//! while let Ok(frame) = source.frames.recv() {
//!     println!("received {} samples @ {}Hz", frame.samples.len(), source.sample_rate);
//! }
//! ```

pub mod capture;
pub mod resample;
pub mod vad;

pub use capture::{open_default_input, AudioFrame, AudioSource, CaptureError, StreamHandle};
pub use resample::{resample_to_16k, stereo_to_mono};
pub use vad::{rms, SourceError, SpeechGate};
