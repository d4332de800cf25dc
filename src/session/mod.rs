//! The voice session: wake phrase, queries, sleep phrase.
//!
//! # Quick start
//!
//! ```rust,no_run
//! # async fn example(
//! #     machine: &mut vocal_assistant::session::SessionStateMachine,
//! #     mic: &dyn vocal_assistant::stt::Transcriber,
//! # ) {
//! use vocal_assistant::config::ListenConfig;
//! use vocal_assistant::stt::ListenParams;
//!
//! let params = ListenParams::from(&ListenConfig::default());
//! let ctrl_c = async {
//!     let _ = tokio::signal::ctrl_c().await;
//! };
//! machine.run(mic, &params, ctrl_c).await;
//! # }
//! ```

pub mod machine;
pub mod runner;
pub mod state;

pub use machine::SessionStateMachine;
pub use state::{contains_phrase, Action, SessionState};
