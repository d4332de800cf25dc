//! The listen loop.
//!
//! One iteration = one listen + one [`handle_listen`].  Iterations never
//! overlap: the next listen starts only after the reply has been spoken.
//!
//! [`handle_listen`]: SessionStateMachine::handle_listen

use std::future::Future;
use std::time::Duration;

use crate::stt::{ListenParams, TranscribeError, Transcriber};

use super::machine::SessionStateMachine;

/// Pause after a transcriber service error before listening again.
const SERVICE_RETRY_DELAY: Duration = Duration::from_secs(1);

impl SessionStateMachine {
    /// Listen and respond until `shutdown` resolves.
    ///
    /// `shutdown` is checked first on every wake-up, so an interrupt lands
    /// even in the middle of a listen or a reply.  Both indicators are off
    /// when this returns.
    pub async fn run<S>(&mut self, transcriber: &dyn Transcriber, params: &ListenParams, shutdown: S)
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        log::info!("session loop started ({})", self.state());

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    log::info!("shutdown requested");
                    break;
                }

                action = async {
                    let heard = transcriber.listen(params).await;
                    let failed = matches!(heard, Err(TranscribeError::Service(_)));
                    let action = self.handle_listen(heard).await;
                    if failed {
                        tokio::time::sleep(SERVICE_RETRY_DELAY).await;
                    }
                    action
                } => {
                    log::debug!("{action:?} (session {})", self.state());
                }
            }
        }

        self.shutdown();
        log::info!("session loop stopped");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::config::ListenConfig;
    use crate::cues::Cue;
    use crate::session::machine::tests::harness;
    use crate::session::SessionState;
    use crate::stt::{ListenParams, ScriptedTranscriber, TranscribeError};

    fn params() -> ListenParams {
        ListenParams::from(&ListenConfig::default())
    }

    #[tokio::test]
    async fn runs_a_whole_session_then_stops() {
        let mut h = harness();
        let mic = ScriptedTranscriber::new(vec![
            Ok("hey assistant".into()),
            Err(TranscribeError::Unintelligible),
            Ok("what's the weather?".into()),
            Ok("goodbye".into()),
        ]);
        let finished = mic.on_finished();

        h.machine
            .run(&mic, &params(), async {
                let _ = finished.await;
            })
            .await;

        assert_eq!(h.machine.state(), SessionState::Dormant);
        assert!(h.machine.history().is_empty());
        assert_eq!(h.speaker.spoken(), vec!["It is sunny."]);
        assert_eq!(
            h.cues.played(),
            vec![Cue::Activated, Cue::Acknowledged, Cue::Ready, Cue::Deactivated]
        );
        assert!(!h.listening.is_on());
        assert!(!h.speaking.is_on());
    }

    #[tokio::test]
    async fn interrupt_while_active_turns_lights_off() {
        let mut h = harness();
        let mic = ScriptedTranscriber::new(vec![Ok("hey assistant".into())]);
        let finished = mic.on_finished();

        h.machine
            .run(&mic, &params(), async {
                let _ = finished.await;
            })
            .await;

        // Interrupted mid-session: still active, but the LED is forced off.
        assert_eq!(h.machine.state(), SessionState::Active);
        assert_eq!(h.listening.events(), vec![true, false]);
        assert!(!h.speaking.is_on());
    }

    #[tokio::test]
    async fn service_errors_are_retried_after_a_pause() {
        let mut h = harness();
        h.machine.handle_utterance(Some("hey assistant")).await;
        let mic = ScriptedTranscriber::new(vec![
            Err(TranscribeError::Service("audio device disconnected".into())),
            Err(TranscribeError::Service("audio device disconnected".into())),
            Err(TranscribeError::Service("audio device disconnected".into())),
        ]);

        h.machine
            .run(&mic, &params(), tokio::time::sleep(Duration::from_millis(200)))
            .await;

        // One failed listen, then still waiting out the pause.
        assert_eq!(mic.remaining(), 2);
        // A broken device is not silence: the session stays awake.
        assert_eq!(h.machine.state(), SessionState::Active);
        assert!(h.speaker.spoken().is_empty());
    }

    #[tokio::test]
    async fn shutdown_interrupts_a_pending_listen() {
        let mut h = harness();
        let mic = ScriptedTranscriber::new(vec![]);

        let stopped = tokio::time::timeout(
            Duration::from_secs(5),
            h.machine
                .run(&mic, &params(), tokio::time::sleep(Duration::from_millis(20))),
        )
        .await;

        assert!(stopped.is_ok(), "loop must stop on shutdown");
        assert_eq!(h.machine.state(), SessionState::Dormant);
    }
}
