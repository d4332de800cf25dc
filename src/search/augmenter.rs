//! Folds a web-search answer into a query.

use std::sync::Arc;

use crate::llm::prompt::with_search_results;
use crate::search::{Locale, SearchProvider, SearchResult};

/// Result of one augmentation lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The engine had a direct answer.
    Answer(SearchResult),
    /// No direct answer, an empty one, or the lookup failed.
    NoAnswer,
}

/// Runs a single lookup per query.  No retries, no ranking, no merging.
#[derive(Clone)]
pub struct SearchAugmenter {
    provider: Arc<dyn SearchProvider>,
    locale: Locale,
}

impl SearchAugmenter {
    pub fn new(provider: Arc<dyn SearchProvider>, locale: Locale) -> Self {
        Self { provider, locale }
    }

    /// Look `query` up.  Provider failures are logged and reported as
    /// [`SearchOutcome::NoAnswer`].
    pub async fn search(&self, query: &str) -> SearchOutcome {
        log::info!("making a web search to find the answer");

        match self.provider.search(query, &self.locale).await {
            Ok(Some(result)) if !result.text.trim().is_empty() => {
                log::debug!("web search answer: {}", result.text);
                SearchOutcome::Answer(result)
            }
            Ok(_) => {
                log::debug!("web search found no direct answer");
                SearchOutcome::NoAnswer
            }
            Err(e) => {
                log::error!("web search failed: {e}");
                SearchOutcome::NoAnswer
            }
        }
    }

    /// Append the answer to `query`, or return `query` unchanged.
    pub fn augment(query: &str, outcome: &SearchOutcome) -> String {
        match outcome {
            SearchOutcome::Answer(result) => with_search_results(query, &result.text),
            SearchOutcome::NoAnswer => query.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::MockSearchProvider;

    fn augmenter(provider: MockSearchProvider) -> (SearchAugmenter, Arc<MockSearchProvider>) {
        let provider = Arc::new(provider);
        (
            SearchAugmenter::new(provider.clone(), Locale::default()),
            provider,
        )
    }

    #[tokio::test]
    async fn answer_is_returned_and_folded_into_query() {
        let (aug, provider) = augmenter(MockSearchProvider::answering("14:32 JST"));

        let outcome = aug.search("What time is it in Tokyo?").await;
        assert_eq!(outcome, SearchOutcome::Answer(SearchResult::new("14:32 JST")));
        assert_eq!(provider.queries(), vec!["What time is it in Tokyo?"]);

        let query = SearchAugmenter::augment("What time is it in Tokyo?", &outcome);
        assert!(query.contains("What time is it in Tokyo?"));
        assert!(query.contains("14:32 JST"));
    }

    #[tokio::test]
    async fn no_answer_leaves_query_unchanged() {
        let (aug, _) = augmenter(MockSearchProvider::empty());
        let outcome = aug.search("meaning of life").await;
        assert_eq!(outcome, SearchOutcome::NoAnswer);
        assert_eq!(
            SearchAugmenter::augment("meaning of life", &outcome),
            "meaning of life"
        );
    }

    #[tokio::test]
    async fn blank_answer_counts_as_no_answer() {
        let (aug, _) = augmenter(MockSearchProvider::answering("   "));
        assert_eq!(aug.search("q").await, SearchOutcome::NoAnswer);
    }

    #[tokio::test]
    async fn provider_failure_counts_as_no_answer() {
        let (aug, provider) = augmenter(MockSearchProvider::failing());
        assert_eq!(aug.search("q").await, SearchOutcome::NoAnswer);
        // Exactly one attempt, no retry.
        assert_eq!(provider.queries().len(), 1);
    }
}
