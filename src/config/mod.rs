//! Configuration module for the vocal assistant.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for each subsystem,
//! `AppPaths` for cross-platform data directories, TOML persistence via
//! `AppConfig::load` / `AppConfig::save_to`, and environment overrides via
//! `AppConfig::apply_env`.

pub mod env;
pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AppConfig, CueConfig, IndicatorConfig, ListenConfig, LlmConfig, LoggingConfig,
    ModelFailureReply, SearchConfig, SessionConfig, SpeechConfig,
};
