//! Environment-variable overrides, applied on top of `settings.toml`.
//!
//! | Variable             | Field                           |
//! |----------------------|---------------------------------|
//! | `WAKE_WORD`          | `session.wake_phrase`           |
//! | `SLEEP_WORD`         | `session.sleep_phrase`          |
//! | `ASSISTANT_NAME`     | `session.assistant_name`        |
//! | `ASSISTANT_LOCATION` | `session.location`              |
//! | `WEB_SEARCH`         | `session.allow_web_search`      |
//! | `REC_TIMEOUT`        | `listen.timeout_secs`           |
//! | `REC_ADAPT_DURATION` | `listen.adapt_duration_secs`    |
//! | `REC_LANGUAGE`       | `listen.language`               |
//! | `WHISPER_MODEL`      | `listen.model_path`             |
//! | `PLAY_LANGUAGE`      | `speech.language`               |
//! | `PLAY_REGION`        | `speech.region`                 |
//! | `REC_LED_PIN`        | `indicator.listening_pin`       |
//! | `PLAY_LED_PIN`       | `indicator.speaking_pin`        |
//! | `LOGGING_LEVEL`      | `logging.level`                 |
//! | `LOG_FILENAME`       | `logging.file`                  |
//! | `OPENAI_API_KEY`     | `llm.api_key`                   |
//! | `OPENAI_BASE_URL`    | `llm.base_url`                  |
//! | `OPENAI_MODEL`       | `llm.model`                     |
//! | `SERPAPI_API_KEY`    | `search.api_key`                |
//!
//! Values that fail to parse are skipped and returned to the caller, which
//! reports them once logging is up; the file (or default) value stays in
//! place.

use std::path::PathBuf;
use std::str::FromStr;

use super::AppConfig;

impl AppConfig {
    /// Apply overrides from the process environment.
    ///
    /// Returns the rejected `KEY="value"` pairs.
    pub fn apply_env(&mut self) -> Vec<String> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (the process environment in
    /// production, a map in tests).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut rejected = Vec::new();

        if let Some(v) = get("WAKE_WORD") {
            self.session.wake_phrase = v;
        }
        if let Some(v) = get("SLEEP_WORD") {
            self.session.sleep_phrase = v;
        }
        if let Some(v) = get("ASSISTANT_NAME") {
            self.session.assistant_name = v;
        }
        if let Some(v) = get("ASSISTANT_LOCATION") {
            self.session.location = v;
        }
        if let Some(v) = parsed::<bool>("WEB_SEARCH", get("WEB_SEARCH"), &mut rejected) {
            self.session.allow_web_search = v;
        }

        if let Some(v) = parsed("REC_TIMEOUT", get("REC_TIMEOUT"), &mut rejected) {
            self.listen.timeout_secs = v;
        }
        if let Some(v) = parsed("REC_ADAPT_DURATION", get("REC_ADAPT_DURATION"), &mut rejected) {
            self.listen.adapt_duration_secs = v;
        }
        if let Some(v) = get("REC_LANGUAGE") {
            self.listen.language = v;
        }
        if let Some(v) = get("WHISPER_MODEL") {
            self.listen.model_path = PathBuf::from(v);
        }

        if let Some(v) = get("PLAY_LANGUAGE") {
            self.speech.language = v;
        }
        if let Some(v) = get("PLAY_REGION") {
            self.speech.region = v;
        }

        if let Some(v) = parsed("REC_LED_PIN", get("REC_LED_PIN"), &mut rejected) {
            self.indicator.listening_pin = v;
        }
        if let Some(v) = parsed("PLAY_LED_PIN", get("PLAY_LED_PIN"), &mut rejected) {
            self.indicator.speaking_pin = v;
        }

        if let Some(v) = get("LOGGING_LEVEL") {
            self.logging.level = v.to_lowercase();
        }
        if let Some(v) = get("LOG_FILENAME") {
            self.logging.file = Some(PathBuf::from(v));
        }

        if let Some(v) = get("OPENAI_API_KEY") {
            self.llm.api_key = Some(v);
        }
        if let Some(v) = get("OPENAI_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Some(v) = get("OPENAI_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = get("SERPAPI_API_KEY") {
            self.search.api_key = Some(v);
        }

        rejected
    }
}

fn parsed<T: FromStr>(key: &str, raw: Option<String>, rejected: &mut Vec<String>) -> Option<T> {
    let raw = raw?;
    match raw.trim().to_lowercase().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            rejected.push(format!("{key}={raw:?}"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn apply(vars: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut config = AppConfig::default();
        let rejected = config.apply_overrides(|key| map.get(key).cloned());
        assert!(rejected.is_empty(), "{rejected:?}");
        config
    }

    #[test]
    fn no_variables_keeps_defaults() {
        let config = apply(&[]);
        assert_eq!(config.session.wake_phrase, "hey assistant");
        assert_eq!(config.listen.timeout_secs, 10);
    }

    #[test]
    fn string_overrides() {
        let config = apply(&[
            ("WAKE_WORD", "hello pi"),
            ("SLEEP_WORD", "bye"),
            ("ASSISTANT_NAME", "Pi"),
            ("REC_LANGUAGE", "fr-FR"),
            ("PLAY_REGION", "co.uk"),
            ("OPENAI_API_KEY", "sk-env"),
            ("SERPAPI_API_KEY", "serp-env"),
            ("LOG_FILENAME", "/var/log/pi.log"),
            ("LOGGING_LEVEL", "DEBUG"),
        ]);
        assert_eq!(config.session.wake_phrase, "hello pi");
        assert_eq!(config.session.sleep_phrase, "bye");
        assert_eq!(config.session.assistant_name, "Pi");
        assert_eq!(config.listen.language, "fr-FR");
        assert_eq!(config.speech.region, "co.uk");
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.search.api_key.as_deref(), Some("serp-env"));
        assert_eq!(config.logging.file, Some(PathBuf::from("/var/log/pi.log")));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn numeric_overrides() {
        let config = apply(&[
            ("REC_TIMEOUT", "5"),
            ("REC_ADAPT_DURATION", "1.5"),
            ("REC_LED_PIN", "17"),
            ("PLAY_LED_PIN", "27"),
            ("WEB_SEARCH", "False"),
        ]);
        assert_eq!(config.listen.timeout_secs, 5);
        assert!((config.listen.adapt_duration_secs - 1.5).abs() < f32::EPSILON);
        assert_eq!(config.indicator.listening_pin, 17);
        assert_eq!(config.indicator.speaking_pin, 27);
        assert!(!config.session.allow_web_search);
    }

    #[test]
    fn unparseable_values_are_ignored_and_reported() {
        let mut config = AppConfig::default();
        let rejected = config.apply_overrides(|key| match key {
            "REC_TIMEOUT" => Some("soon".into()),
            "REC_LED_PIN" => Some("-3".into()),
            "WAKE_WORD" => Some("hello pi".into()),
            _ => None,
        });

        assert_eq!(config.listen.timeout_secs, 10);
        assert_eq!(config.indicator.listening_pin, 24);
        assert_eq!(config.session.wake_phrase, "hello pi");
        assert_eq!(rejected, vec![r#"REC_TIMEOUT="soon""#, r#"REC_LED_PIN="-3""#]);
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = apply(&[("WAKE_WORD", "   ")]);
        assert_eq!(config.session.wake_phrase, "hey assistant");
    }
}
