//! Hands-free voice assistant.
//!
//! A dormant session wakes on a configured phrase, answers spoken queries
//! with a chat model (optionally backed by a web search), speaks the
//! replies, and goes back to sleep on the sleep phrase or after a silent
//! listen.
//!
//! | Module           | Role                                              |
//! |------------------|---------------------------------------------------|
//! | [`session`]      | wake/sleep state machine and the listen loop      |
//! | [`query`]        | one query → extended conversation                 |
//! | [`conversation`] | role-checked chat history                         |
//! | [`llm`]          | chat model client, prompts, search decision       |
//! | [`search`]       | web search answer box and query augmentation      |
//! | [`stt`]          | microphone + Whisper transcription                |
//! | [`audio`]        | capture, level detection, resampling              |
//! | [`speech`]       | text-to-speech playback                           |
//! | [`indicator`]    | GPIO status lights                                |
//! | [`cues`]         | short state-change sounds                         |
//! | [`config`]       | TOML settings and environment overrides           |
//! | [`logging`]      | console + file logging                            |

pub mod audio;
pub mod config;
pub mod conversation;
pub mod cues;
pub mod indicator;
pub mod llm;
pub mod logging;
pub mod query;
pub mod search;
pub mod session;
pub mod speech;
pub mod stt;
