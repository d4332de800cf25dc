//! Web search used to give the model live information.
//!
//! * [`SearchProvider`]: async trait for one lookup returning a direct
//!   answer, if the engine has one.
//! * [`SerpApiProvider`]: Google results through SerpApi's answer box.
//! * [`SearchAugmenter`]: runs one lookup and folds the answer into the
//!   query text.

pub mod augmenter;
pub mod serpapi;

use async_trait::async_trait;
use thiserror::Error;

pub use augmenter::{SearchAugmenter, SearchOutcome};
pub use serpapi::SerpApiProvider;

// ---------------------------------------------------------------------------
// SearchError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Request(String),

    #[error("search request timed out")]
    Timeout,

    #[error("search endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to parse search response: {0}")]
    Parse(String),

    /// The provider reported a problem in its JSON body (bad key, quota, …).
    #[error("search provider error: {0}")]
    Provider(String),
}

/// The request URL carries the API key, so it is stripped from the message.
impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SearchError::Timeout
        } else {
            SearchError::Request(e.without_url().to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Locale / SearchResult
// ---------------------------------------------------------------------------

/// Language and country a search is run with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    /// Interface language (`hl`), e.g. `"en"`.
    pub language: String,
    /// Country (`gl`), e.g. `"fr"`.
    pub country: String,
}

impl Default for Locale {
    fn default() -> Self {
        Self {
            language: "en".into(),
            country: "fr".into(),
        }
    }
}

/// A direct answer snippet.  Lives only for one augmentation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub text: String,
}

impl SearchResult {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl std::fmt::Display for SearchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

// ---------------------------------------------------------------------------
// SearchProvider trait
// ---------------------------------------------------------------------------

/// One web lookup.  `Ok(None)` means the engine found no direct answer.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, locale: &Locale)
        -> Result<Option<SearchResult>, SearchError>;
}

// ---------------------------------------------------------------------------
// MockSearchProvider  (test-only)
// ---------------------------------------------------------------------------

/// Test double with a fixed answer that records every query it sees.
#[cfg(test)]
pub struct MockSearchProvider {
    answer: Option<String>,
    fail: bool,
    queries: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl MockSearchProvider {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: Some(answer.to_string()),
            fail: false,
            queries: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self {
            answer: None,
            fail: false,
            queries: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: None,
            fail: true,
            queries: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl SearchProvider for MockSearchProvider {
    async fn search(
        &self,
        query: &str,
        _locale: &Locale,
    ) -> Result<Option<SearchResult>, SearchError> {
        self.queries.lock().unwrap().push(query.to_string());
        if self.fail {
            return Err(SearchError::Timeout);
        }
        Ok(self.answer.as_deref().map(SearchResult::new))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn request_errors_do_not_reveal_the_api_key() {
        // Nothing listens on the discard port.
        let err = reqwest::Client::new()
            .get("http://127.0.0.1:9/search.json?engine=google&q=x&api_key=SECRET123")
            .send()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("SECRET123"));

        let message = SearchError::from(err).to_string();
        assert!(!message.contains("SECRET123"), "{message}");
        assert!(!message.contains("api_key"), "{message}");
    }
}
