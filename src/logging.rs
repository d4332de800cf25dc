//! Logging setup: console plus an optional log file.
//!
//! Both outputs share the format
//! `2024-03-14 15:09:26 - vocal_assistant::session - INFO - message`.
//! The console honours the configured level (or `RUST_LOG`); the file keeps
//! everything from `debug` up and is appended to across runs.

use std::fs::OpenOptions;
use std::io::Write;

use anyhow::{Context, Result};
use log::{LevelFilter, Log, Metadata, Record};

use crate::config::LoggingConfig;

/// Parse a level name.  Accepts the usual `log` names plus `warning` and
/// `critical`; anything else falls back to `info`.
pub fn parse_level(name: &str) -> LevelFilter {
    match name.trim().to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "critical" | "error" => LevelFilter::Error,
        "warning" | "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

fn format_record(buf: &mut env_logger::fmt::Formatter, record: &Record) -> std::io::Result<()> {
    writeln!(
        buf,
        "{} - {} - {} - {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        record.target(),
        record.level(),
        record.args()
    )
}

/// Sends every record to each inner logger that accepts it.
struct Tee {
    loggers: Vec<env_logger::Logger>,
}

impl Log for Tee {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.loggers.iter().any(|l| l.enabled(metadata))
    }

    fn log(&self, record: &Record) {
        for logger in &self.loggers {
            if logger.matches(record) {
                logger.log(record);
            }
        }
    }

    fn flush(&self) {
        for logger in &self.loggers {
            logger.flush();
        }
    }
}

fn console_logger(level: LevelFilter) -> env_logger::Logger {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(level.to_string().to_ascii_lowercase()),
    )
    .format(format_record)
    .build()
}

fn file_logger(file: std::fs::File) -> env_logger::Logger {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Debug)
        .filter_module("hyper", LevelFilter::Info)
        .filter_module("hyper_util", LevelFilter::Info)
        .filter_module("reqwest", LevelFilter::Info)
        .format(format_record)
        .target(env_logger::Target::Pipe(Box::new(file)))
        .build()
}

/// Install the global logger.  Call once, early in `main`.
///
/// # Errors
///
/// The log file cannot be opened, or a logger is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let mut loggers = vec![console_logger(parse_level(&config.level))];

    if let Some(path) = &config.file {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening log file {}", path.display()))?;
        loggers.push(file_logger(file));
    }

    let max = loggers
        .iter()
        .map(env_logger::Logger::filter)
        .max()
        .unwrap_or(LevelFilter::Info);

    log::set_boxed_logger(Box::new(Tee { loggers })).context("installing logger")?;
    log::set_max_level(max);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names() {
        assert_eq!(parse_level("DEBUG"), LevelFilter::Debug);
        assert_eq!(parse_level("warning"), LevelFilter::Warn);
        assert_eq!(parse_level("critical"), LevelFilter::Error);
        assert_eq!(parse_level(" info "), LevelFilter::Info);
        assert_eq!(parse_level("verbose"), LevelFilter::Info);
    }

    /// Log `message` at `level` if the logger accepts it.
    fn emit(logger: &env_logger::Logger, level: log::Level, message: &str) -> bool {
        let matched = logger.matches(
            &Record::builder()
                .level(level)
                .target("vocal_assistant::session")
                .args(format_args!("{message}"))
                .build(),
        );
        if matched {
            logger.log(
                &Record::builder()
                    .level(level)
                    .target("vocal_assistant::session")
                    .args(format_args!("{message}"))
                    .build(),
            );
            logger.flush();
        }
        matched
    }

    #[test]
    fn file_logger_keeps_debug_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assistant.log");
        let file = OpenOptions::new().create(true).append(true).open(&path).unwrap();
        let logger = file_logger(file);

        assert!(emit(&logger, log::Level::Debug, "wake phrase heard"));

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.ends_with(" - vocal_assistant::session - DEBUG - wake phrase heard\n"));
    }

    #[test]
    fn file_logger_drops_trace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.log");
        let logger = file_logger(std::fs::File::create(&path).unwrap());

        assert!(!emit(&logger, log::Level::Trace, "noise"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }
}
