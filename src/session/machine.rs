//! [`SessionStateMachine`]: routes each transcription.
//!
//! # Per-utterance flow
//!
//! ```text
//! Dormant
//!   ├─ wake phrase  → Active, listening LED on, Activated cue
//!   └─ anything else / silence → listening LED off, ignored
//! Active
//!   ├─ silence or sleep phrase → Dormant, history cleared,
//!   │                            listening LED off, Deactivated cue
//!   └─ query → listening LED off, Acknowledged cue
//!        → QueryProcessor
//!        → speaking LED on, speak reply (or failure text), speaking LED off
//!        → listening LED on, Ready cue
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{ModelFailureReply, SessionConfig};
use crate::conversation::ConversationHistory;
use crate::cues::{Cue, CuePlayer};
use crate::indicator::Indicators;
use crate::query::{QueryProcessor, QuerySettings};
use crate::speech::Speaker;
use crate::stt::TranscribeError;

use super::state::{contains_phrase, Action, SessionState};

/// File name saved replies are numbered from inside the archive directory.
const ARCHIVE_FILE_NAME: &str = "reply.mp3";

/// Owns the session state and the conversation; one instance per process.
pub struct SessionStateMachine {
    state: SessionState,
    history: ConversationHistory,
    processor: QueryProcessor,
    speaker: Arc<dyn Speaker>,
    indicators: Indicators,
    cues: Arc<dyn CuePlayer>,
    config: SessionConfig,
    settings: QuerySettings,
}

impl SessionStateMachine {
    pub fn new(
        processor: QueryProcessor,
        speaker: Arc<dyn Speaker>,
        indicators: Indicators,
        cues: Arc<dyn CuePlayer>,
        config: SessionConfig,
    ) -> Self {
        Self {
            state: SessionState::Dormant,
            history: ConversationHistory::new(),
            processor,
            speaker,
            indicators,
            cues,
            settings: QuerySettings::from(&config),
            config,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    // -----------------------------------------------------------------------
    // Entry points
    // -----------------------------------------------------------------------

    /// Adapt a raw listen result.
    ///
    /// A timeout is an absent utterance.  Unintelligible speech and
    /// recogniser failures change nothing; the next listen is the retry.
    pub async fn handle_listen(&mut self, heard: Result<String, TranscribeError>) -> Action {
        match heard {
            Ok(text) => self.handle_utterance(Some(&text)).await,
            Err(TranscribeError::TimedOut) => self.handle_utterance(None).await,
            Err(TranscribeError::Unintelligible) => {
                log::debug!("could not understand the audio");
                Action::Ignored
            }
            Err(e @ TranscribeError::Service(_)) => {
                log::error!("{e}");
                Action::Ignored
            }
        }
    }

    /// Route one utterance; `None` means nobody spoke before the timeout.
    pub async fn handle_utterance(&mut self, utterance: Option<&str>) -> Action {
        match self.state {
            SessionState::Dormant => self.while_dormant(utterance),
            SessionState::Active => match utterance {
                None => {
                    log::info!("no speech, going back to sleep");
                    self.deactivate()
                }
                Some(text) if contains_phrase(text, &self.config.sleep_phrase) => {
                    log::info!("sleep phrase heard");
                    self.deactivate()
                }
                Some(text) if text.trim().is_empty() => Action::Ignored,
                Some(query) => self.answer(query.trim()).await,
            },
        }
    }

    /// Turn both lights off; used when the loop exits.
    pub fn shutdown(&self) {
        self.indicators.all_off();
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    fn while_dormant(&mut self, utterance: Option<&str>) -> Action {
        match utterance {
            Some(text) if contains_phrase(text, &self.config.wake_phrase) => {
                log::info!("wake phrase heard, listening for queries");
                self.state = SessionState::Active;
                self.indicators.listening.on();
                self.cues.play(Cue::Activated);
                Action::Activated
            }
            _ => {
                self.indicators.listening.off();
                Action::Ignored
            }
        }
    }

    fn deactivate(&mut self) -> Action {
        self.state = SessionState::Dormant;
        self.history.clear();
        self.indicators.listening.off();
        self.cues.play(Cue::Deactivated);
        Action::Deactivated
    }

    async fn answer(&mut self, query: &str) -> Action {
        log::info!("query: {query}");
        self.indicators.listening.off();
        self.cues.play(Cue::Acknowledged);

        let action = match self
            .processor
            .process(query, &self.history, &self.settings)
            .await
        {
            Ok(history) => {
                let reply = history.last_reply().unwrap_or_default().to_string();
                self.history = history;
                log::info!("reply: {reply}");
                self.say(&reply).await;
                Action::Replied(reply)
            }
            Err(e) => {
                log::error!("{e}");
                let spoken = match self.config.failure_reply {
                    ModelFailureReply::Apology => self.config.apology.clone(),
                    ModelFailureReply::ErrorText => e.to_string(),
                };
                self.say(&spoken).await;
                Action::Failed(e.to_string())
            }
        };

        self.indicators.listening.on();
        self.cues.play(Cue::Ready);
        action
    }

    async fn say(&self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        let archive = self.archive_path();

        self.indicators.speaking.on();
        if let Err(e) = self.speaker.speak(text, archive.as_deref()).await {
            log::error!("could not speak the reply: {e}");
        }
        self.indicators.speaking.off();
    }

    fn archive_path(&self) -> Option<PathBuf> {
        self.config
            .archive_dir
            .as_ref()
            .map(|dir| dir.join(ARCHIVE_FILE_NAME))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
