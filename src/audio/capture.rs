//! Microphone capture via `cpal`.
//!
//! [`open_default_input`] opens the default input device once for the whole
//! process.  It returns a [`StreamHandle`] (RAII guard, keep it alive on the
//! thread that opened it) and an [`AudioSource`] that can be moved to a
//! blocking worker to read mono frames.

use std::sync::mpsc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample};
use thiserror::Error;

use crate::audio::stereo_to_mono;

// ---------------------------------------------------------------------------
// AudioFrame / AudioSource
// ---------------------------------------------------------------------------

/// One hardware buffer, already downmixed to mono `f32` in `[-1.0, 1.0]`.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub samples: Vec<f32>,
}

/// Receiving end of the capture stream.
pub struct AudioSource {
    pub frames: mpsc::Receiver<AudioFrame>,
    /// Native device rate in Hz (commonly 44 100 or 48 000).
    pub sample_rate: u32,
}

impl AudioSource {
    /// Discard everything captured so far (e.g. the assistant's own voice
    /// while it was speaking).  Returns the number of frames dropped.
    pub fn drain(&self) -> usize {
        self.frames.try_iter().count()
    }
}

// ---------------------------------------------------------------------------
// StreamHandle
// ---------------------------------------------------------------------------

/// RAII guard that keeps the cpal stream alive.
///
/// `cpal::Stream` is not `Send` on every platform, so the handle stays with
/// the task that opened it while the [`AudioSource`] travels.
pub struct StreamHandle {
    _stream: cpal::Stream,
}

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("unsupported input sample format: {0:?}")]
    SampleFormat(SampleFormat),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

// ---------------------------------------------------------------------------
// open_default_input
// ---------------------------------------------------------------------------

/// Open the system default microphone and start streaming.
///
/// # Errors
///
/// [`CaptureError::NoDevice`] when no input device is available; the other
/// variants when the platform rejects the stream.
pub fn open_default_input() -> Result<(StreamHandle, AudioSource), CaptureError> {
    let host = cpal::default_host();
    let device = host.default_input_device().ok_or(CaptureError::NoDevice)?;

    let supported = device.default_input_config()?;
    let format = supported.sample_format();
    let sample_rate = supported.sample_rate().0;
    let config: cpal::StreamConfig = supported.into();

    if let Ok(name) = device.name() {
        log::info!(
            "microphone: {name} ({sample_rate} Hz, {} channel(s), {format:?})",
            config.channels
        );
    }

    let (tx, rx) = mpsc::channel();
    let stream = match format {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, tx)?,
        SampleFormat::I16 => build_stream::<i16>(&device, &config, tx)?,
        SampleFormat::U16 => build_stream::<u16>(&device, &config, tx)?,
        other => return Err(CaptureError::SampleFormat(other)),
    };
    stream.play()?;

    Ok((
        StreamHandle { _stream: stream },
        AudioSource {
            frames: rx,
            sample_rate,
        },
    ))
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    tx: mpsc::Sender<AudioFrame>,
) -> Result<cpal::Stream, CaptureError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = config.channels;
    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            let interleaved: Vec<f32> = data.iter().map(|&s| f32::from_sample_(s)).collect();
            let frame = AudioFrame {
                samples: stereo_to_mono(&interleaved, channels),
            };
            // The receiver only goes away at shutdown.
            let _ = tx.send(frame);
        },
        |err: cpal::StreamError| {
            log::error!("cpal stream error: {err}");
        },
        None,
    )?;
    Ok(stream)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
