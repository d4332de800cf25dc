//! Short audio cues marking session transitions.
//!
//! Cues are fire-and-forget: [`CuePlayer::play`] starts playback and returns
//! immediately, so a cue never delays the next listen.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use crate::config::CueConfig;

/// Which transition a cue announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    /// The wake phrase was heard.
    Activated,
    /// A reply finished; the assistant listens again.
    Ready,
    /// The session went back to sleep.
    Deactivated,
    /// A query was heard and is being processed.
    Acknowledged,
}

pub trait CuePlayer: Send + Sync {
    /// Start playing `cue` without waiting for it to finish.
    fn play(&self, cue: Cue);
}

/// Plays nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCuePlayer;

impl CuePlayer for NullCuePlayer {
    fn play(&self, _cue: Cue) {}
}

// ---------------------------------------------------------------------------
// ProcessCuePlayer
// ---------------------------------------------------------------------------

/// Spawns an external player (`mpg123 -q <file>`) per cue.
#[derive(Debug, Clone)]
pub struct ProcessCuePlayer {
    program: String,
    activated: PathBuf,
    ready: PathBuf,
    deactivated: PathBuf,
    acknowledged: PathBuf,
}

impl ProcessCuePlayer {
    pub fn from_config(config: &CueConfig, program: &str) -> Self {
        Self {
            program: program.to_string(),
            activated: config.dir.join(&config.activated),
            ready: config.dir.join(&config.ready),
            deactivated: config.dir.join(&config.deactivated),
            acknowledged: config.dir.join(&config.acknowledged),
        }
    }

    pub fn file_for(&self, cue: Cue) -> &PathBuf {
        match cue {
            Cue::Activated => &self.activated,
            Cue::Ready => &self.ready,
            Cue::Deactivated => &self.deactivated,
            Cue::Acknowledged => &self.acknowledged,
        }
    }
}

impl CuePlayer for ProcessCuePlayer {
    fn play(&self, cue: Cue) {
        let file = self.file_for(cue);
        if !file.exists() {
            log::warn!("cue {cue:?}: {} not found", file.display());
            return;
        }

        // The child is never awaited; tokio reaps it once it exits.
        let spawned = tokio::process::Command::new(&self.program)
            .arg("-q")
            .arg(file)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        if let Err(e) = spawned {
            log::warn!("cue {cue:?}: cannot start {}: {e}", self.program);
        }
    }
}

/// Build the configured cue player.
pub fn cue_player(config: &CueConfig, program: &str) -> Arc<dyn CuePlayer> {
    if config.enabled {
        Arc::new(ProcessCuePlayer::from_config(config, program))
    } else {
        Arc::new(NullCuePlayer)
    }
}

// ---------------------------------------------------------------------------
// RecordingCuePlayer  (test-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
#[derive(Default)]
pub struct RecordingCuePlayer {
    played: std::sync::Mutex<Vec<Cue>>,
}

#[cfg(test)]
impl RecordingCuePlayer {
    pub fn played(&self) -> Vec<Cue> {
        self.played.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl CuePlayer for RecordingCuePlayer {
    fn play(&self, cue: Cue) {
        self.played.lock().unwrap().push(cue);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
