//! Language-model module for the vocal assistant.
//!
//! This module provides:
//! * [`ChatModel`]: async trait implemented by all completion backends.
//! * [`OpenAiChatModel`]: OpenAI-compatible REST API backend.
//! * [`SearchDecider`] / [`SearchDecision`]: "does this query need the web?"
//! * [`prompt`]: persona system prompt and search-block formatting.
//! * [`ChatError`]: error variants for model calls.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use vocal_assistant::config::AppConfig;
//! use vocal_assistant::conversation::Turn;
//! use vocal_assistant::llm::{ChatModel, OpenAiChatModel};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let model = OpenAiChatModel::from_config(&config.llm);
//!
//!     let reply = model
//!         .complete(&[Turn::user("Say hello in French.")])
//!         .await
//!         .unwrap();
//!     println!("{reply}");
//! }
//! ```

pub mod chat;
pub mod decision;
pub mod prompt;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use chat::{ChatError, ChatModel, OpenAiChatModel};
pub use decision::{SearchDecider, SearchDecision};

#[cfg(test)]
pub use chat::MockChatModel;
