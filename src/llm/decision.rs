//! Web-search classification: asks the chat model whether a query needs
//! live information.
//!
//! [`SearchDecider::classify`] returns a tagged [`SearchDecision`] so the
//! "model unreachable" case stays visible to callers.  The business rule
//! that an unavailable classifier means *no search* lives in
//! [`SearchDecider::is_search_required`].

use std::sync::Arc;

use crate::conversation::Turn;
use crate::llm::chat::ChatModel;
use crate::llm::prompt::SEARCH_DECISION_INSTRUCTION;

/// Outcome of one classification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDecision {
    /// The model answered; `true` means a web search is needed.
    Decided(bool),
    /// The model could not be reached or failed.
    Unavailable,
}

/// Issues the forced-choice True/False request.
#[derive(Clone)]
pub struct SearchDecider {
    model: Arc<dyn ChatModel>,
}

impl SearchDecider {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Ask the model whether `query` needs live web data.
    ///
    /// Only a reply equal to `"true"` after trimming and lowercasing counts
    /// as a yes; anything else is a no.
    pub async fn classify(&self, query: &str) -> SearchDecision {
        let turns = [
            Turn::system(SEARCH_DECISION_INSTRUCTION),
            Turn::user(query),
        ];

        match self.model.complete(&turns).await {
            Ok(reply) => {
                let decided = reply.trim().to_lowercase() == "true";
                log::debug!("search decision: {reply:?} -> {decided}");
                SearchDecision::Decided(decided)
            }
            Err(e) => {
                log::error!("search decision unavailable: {e}");
                SearchDecision::Unavailable
            }
        }
    }

    /// `classify`, with an unavailable classifier treated as "no search".
    pub async fn is_search_required(&self, query: &str) -> bool {
        match self.classify(query).await {
            SearchDecision::Decided(required) => required,
            SearchDecision::Unavailable => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;
    use crate::llm::chat::MockChatModel;

    fn make_decider(model: MockChatModel) -> (SearchDecider, Arc<MockChatModel>) {
        let model = Arc::new(model);
        (SearchDecider::new(model.clone()), model)
    }

    #[tokio::test]
    async fn true_reply_requires_search() {
        let (decider, _) = make_decider(MockChatModel::replying("True"));
        assert_eq!(
            decider.classify("weather tomorrow?").await,
            SearchDecision::Decided(true)
        );
        assert!(decider.is_search_required("weather tomorrow?").await);
    }

    #[tokio::test]
    async fn reply_is_trimmed_and_case_folded() {
        let (decider, _) = make_decider(MockChatModel::replying("  TRUE \n"));
        assert!(decider.is_search_required("news").await);
    }

    #[tokio::test]
    async fn anything_but_true_means_no_search() {
        for reply in ["False", "false", "Yes", "True.", "maybe"] {
            let (decider, _) = make_decider(MockChatModel::replying(reply));
            assert_eq!(
                decider.classify("tell me a joke").await,
                SearchDecision::Decided(false),
                "reply {reply:?}"
            );
        }
    }

    #[tokio::test]
    async fn failure_is_unavailable_and_fails_open() {
        let (decider, _) = make_decider(MockChatModel::failing());
        assert_eq!(
            decider.classify("stock price").await,
            SearchDecision::Unavailable
        );
        assert!(!decider.is_search_required("stock price").await);
    }

    #[tokio::test]
    async fn request_carries_instruction_then_query() {
        let (decider, model) = make_decider(MockChatModel::replying("False"));
        decider.classify("who won the match?").await;

        let calls = model.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 2);
        assert_eq!(calls[0][0].role, Role::System);
        assert_eq!(calls[0][0].content, SEARCH_DECISION_INSTRUCTION);
        assert_eq!(calls[0][1], Turn::user("who won the match?"));
    }
}
