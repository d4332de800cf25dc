//! Indicator lights: one LED while listening, one while speaking.
//!
//! [`GpioIndicator`] drives a pin through the Linux sysfs GPIO interface
//! (`/sys/class/gpio`).  Writes are best effort: a failing LED is logged and
//! never interrupts the conversation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::config::IndicatorConfig;

const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

// ---------------------------------------------------------------------------
// IndicatorError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum IndicatorError {
    #[error("cannot export GPIO pin {pin}: {source}")]
    Export {
        pin: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot configure GPIO pin {pin} as output: {source}")]
    Direction {
        pin: u32,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Indicator trait
// ---------------------------------------------------------------------------

/// An on/off light.  Both calls are idempotent and never fail.
pub trait Indicator: Send + Sync {
    fn on(&self);
    fn off(&self);
}

/// Used when no hardware is present or indicators are disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullIndicator;

impl Indicator for NullIndicator {
    fn on(&self) {}
    fn off(&self) {}
}

// ---------------------------------------------------------------------------
// GpioIndicator
// ---------------------------------------------------------------------------

/// LED on a sysfs GPIO pin.
#[derive(Debug)]
pub struct GpioIndicator {
    pin: u32,
    value_path: PathBuf,
}

impl GpioIndicator {
    /// Export `pin` and configure it as an output.
    pub fn new(pin: u32) -> Result<Self, IndicatorError> {
        Self::with_root(Path::new(SYSFS_GPIO_ROOT), pin)
    }

    /// Same as [`new`](Self::new) against an arbitrary sysfs root.
    pub fn with_root(root: &Path, pin: u32) -> Result<Self, IndicatorError> {
        let pin_dir = root.join(format!("gpio{pin}"));

        if !pin_dir.exists() {
            std::fs::write(root.join("export"), pin.to_string())
                .map_err(|source| IndicatorError::Export { pin, source })?;
        }

        std::fs::write(pin_dir.join("direction"), "out")
            .map_err(|source| IndicatorError::Direction { pin, source })?;

        log::debug!("indicator initialised on GPIO pin {pin}");
        Ok(Self {
            pin,
            value_path: pin_dir.join("value"),
        })
    }

    fn write(&self, value: &str) {
        if let Err(e) = std::fs::write(&self.value_path, value) {
            log::warn!("GPIO pin {}: cannot write {value}: {e}", self.pin);
        }
    }
}

impl Indicator for GpioIndicator {
    fn on(&self) {
        self.write("1");
    }

    fn off(&self) {
        self.write("0");
    }
}

// ---------------------------------------------------------------------------
// Indicators
// ---------------------------------------------------------------------------

/// The assistant's pair of lights.
#[derive(Clone)]
pub struct Indicators {
    /// Lit while waiting for a query.
    pub listening: Arc<dyn Indicator>,
    /// Lit while a reply is being spoken.
    pub speaking: Arc<dyn Indicator>,
}

impl Indicators {
    /// Build GPIO indicators from config.  A pin that cannot be set up is
    /// replaced by a [`NullIndicator`] with a warning.
    pub fn from_config(config: &IndicatorConfig) -> Self {
        if !config.enabled {
            return Self::none();
        }
        Self {
            listening: gpio_or_null(config.listening_pin),
            speaking: gpio_or_null(config.speaking_pin),
        }
    }

    pub fn none() -> Self {
        Self {
            listening: Arc::new(NullIndicator),
            speaking: Arc::new(NullIndicator),
        }
    }

    pub fn all_off(&self) {
        self.listening.off();
        self.speaking.off();
    }
}

fn gpio_or_null(pin: u32) -> Arc<dyn Indicator> {
    match GpioIndicator::new(pin) {
        Ok(led) => Arc::new(led),
        Err(e) => {
            log::warn!("{e}; indicator disabled");
            Arc::new(NullIndicator)
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingIndicator  (test-only)
// ---------------------------------------------------------------------------

/// Test double remembering every on/off call.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingIndicator {
    events: std::sync::Mutex<Vec<bool>>,
}

#[cfg(test)]
impl RecordingIndicator {
    pub fn is_on(&self) -> bool {
        self.events.lock().unwrap().last().copied().unwrap_or(false)
    }

    pub fn events(&self) -> Vec<bool> {
        self.events.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Indicator for RecordingIndicator {
    fn on(&self) {
        self.events.lock().unwrap().push(true);
    }

    fn off(&self) {
        self.events.lock().unwrap().push(false);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
