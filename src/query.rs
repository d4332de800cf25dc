//! Query processing: turns one user query into an extended conversation.
//!
//! # Flow
//!
//! ```text
//! query
//!   ├─ allow_web_search && SearchDecider says yes
//!   │     └─ SearchAugmenter::search → append "information from the web search"
//!   ├─ history empty → push system prompt (persona, location, date/time)
//!   ├─ push user turn
//!   └─ ChatModel::complete(all turns) → push assistant turn
//! ```
//!
//! The caller's history is never touched: [`QueryProcessor::process`] extends
//! a copy and returns it, so a failed model call leaves the session exactly
//! as it was.

use std::sync::Arc;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::conversation::{ConversationHistory, HistoryError};
use crate::llm::prompt::system_prompt;
use crate::llm::{ChatError, ChatModel, SearchDecider};
use crate::search::{SearchAugmenter, SearchOutcome};

// ---------------------------------------------------------------------------
// QueryError
// ---------------------------------------------------------------------------

/// Why a query could not be answered.
///
/// The `Display` text is the user-facing description of the failure.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("An error occurred while processing your query: {0}")]
    Model(#[from] ChatError),

    #[error("An error occurred while processing your query: {0}")]
    History(#[from] HistoryError),
}

// ---------------------------------------------------------------------------
// QuerySettings
// ---------------------------------------------------------------------------

/// Per-session inputs of [`QueryProcessor::process`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySettings {
    pub assistant_name: String,
    pub location: String,
    pub allow_web_search: bool,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            assistant_name: "Assistant".into(),
            location: "Paris - France".into(),
            allow_web_search: true,
        }
    }
}

impl From<&crate::config::SessionConfig> for QuerySettings {
    fn from(config: &crate::config::SessionConfig) -> Self {
        Self {
            assistant_name: config.assistant_name.clone(),
            location: config.location.clone(),
            allow_web_search: config.allow_web_search,
        }
    }
}

// ---------------------------------------------------------------------------
// QueryProcessor
// ---------------------------------------------------------------------------

/// Composes search classification, search augmentation and the model call.
pub struct QueryProcessor {
    model: Arc<dyn ChatModel>,
    decider: SearchDecider,
    augmenter: Option<SearchAugmenter>,
    clock: fn() -> NaiveDateTime,
}

impl QueryProcessor {
    /// `augmenter` is `None` when no search provider is configured; web
    /// search is then skipped without asking the classifier.
    pub fn new(model: Arc<dyn ChatModel>, augmenter: Option<SearchAugmenter>) -> Self {
        Self {
            decider: SearchDecider::new(Arc::clone(&model)),
            model,
            augmenter,
            clock: local_now,
        }
    }

    /// Replace the wall clock used for the system prompt.
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    /// Answer `query` in the context of `history`.
    ///
    /// Returns the extended history (`[system]`, …, user, assistant).
    ///
    /// # Errors
    ///
    /// [`QueryError::Model`] when the completion call fails.  No assistant
    /// turn is produced in that case.
    pub async fn process(
        &self,
        query: &str,
        history: &ConversationHistory,
        settings: &QuerySettings,
    ) -> Result<ConversationHistory, QueryError> {
        let query = self.augment(query, settings).await;

        let mut extended = history.clone();
        if extended.is_empty() {
            extended.push_system(system_prompt(
                &settings.assistant_name,
                &settings.location,
                (self.clock)(),
            ))?;
        }
        extended.push_user(query)?;

        let reply = self.model.complete(extended.turns()).await?;
        extended.push_assistant(reply)?;

        Ok(extended)
    }

    async fn augment(&self, query: &str, settings: &QuerySettings) -> String {
        if !settings.allow_web_search {
            return query.to_string();
        }
        let Some(augmenter) = &self.augmenter else {
            log::debug!("web search allowed but no provider configured");
            return query.to_string();
        };

        if !self.decider.is_search_required(query).await {
            return query.to_string();
        }

        match augmenter.search(query).await {
            outcome @ SearchOutcome::Answer(_) => SearchAugmenter::augment(query, &outcome),
            SearchOutcome::NoAnswer => query.to_string(),
        }
    }
}

fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{Role, Turn};
    use crate::llm::prompt::SEARCH_DECISION_INSTRUCTION;
    use crate::llm::MockChatModel;
    use crate::search::{Locale, MockSearchProvider};
    use chrono::NaiveDate;

    fn fixed_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 14)
            .unwrap()
            .and_hms_opt(15, 9, 26)
            .unwrap()
    }

    fn is_classification(turns: &[Turn]) -> bool {
        turns
            .first()
            .is_some_and(|t| t.content == SEARCH_DECISION_INSTRUCTION)
    }

    /// Answers the classifier with `decision` and every real query with
    /// "reply N" (N = number of user turns so far).
    fn model(decision: &'static str) -> Arc<MockChatModel> {
        Arc::new(MockChatModel::new(move |turns| {
            if is_classification(turns) {
                Ok(decision.to_string())
            } else {
                let n = turns.iter().filter(|t| t.role == Role::User).count();
                Ok(format!("reply {n}"))
            }
        }))
    }

    fn processor(
        model: Arc<MockChatModel>,
        search: Option<Arc<MockSearchProvider>>,
    ) -> QueryProcessor {
        let augmenter = search.map(|p| SearchAugmenter::new(p, Locale::default()));
        QueryProcessor::new(model, augmenter).with_clock(fixed_now)
    }

    fn settings(allow_web_search: bool) -> QuerySettings {
        QuerySettings {
            assistant_name: "Pi".into(),
            location: "Lyon - France".into(),
            allow_web_search,
        }
    }

    #[tokio::test]
    async fn first_query_opens_with_system_prompt() {
        let qp = processor(model("False"), None);
        let history = qp
            .process("hello", &ConversationHistory::new(), &settings(false))
            .await
            .unwrap();

        let turns = history.turns();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].role, Role::System);
        assert!(turns[0].content.contains("Pi"));
        assert!(turns[0].content.contains("Lyon - France"));
        assert!(turns[0].content.contains("2024-03-14"));
        assert!(turns[0].content.contains("15:09:26"));
        assert_eq!(turns[1], Turn::user("hello"));
        assert_eq!(turns[2], Turn::assistant("reply 1"));
    }

    #[tokio::test]
    async fn history_alternates_over_many_calls() {
        let qp = processor(model("False"), None);
        let mut history = ConversationHistory::new();

        let n = 5;
        for i in 0..n {
            history = qp
                .process(&format!("question {i}"), &history, &settings(false))
                .await
                .unwrap();
        }

        assert_eq!(history.len(), 1 + 2 * n);
        for (i, turn) in history.turns().iter().enumerate() {
            match i {
                0 => assert_eq!(turn.role, Role::System),
                i if i % 2 == 1 => assert_eq!(turn.role, Role::User),
                _ => assert_eq!(turn.role, Role::Assistant),
            }
        }
        assert_eq!(history.last_reply(), Some("reply 5"));
    }

    #[tokio::test]
    async fn non_empty_history_never_gets_second_system_turn() {
        let qp = processor(model("False"), None);
        let mut history = ConversationHistory::new();
        history.push_system("custom persona").unwrap();
        history.push_user("earlier").unwrap();
        history.push_assistant("earlier reply").unwrap();

        let history = qp.process("next", &history, &settings(false)).await.unwrap();

        let systems = history
            .turns()
            .iter()
            .filter(|t| t.role == Role::System)
            .count();
        assert_eq!(systems, 1);
        assert_eq!(history.turns()[0].content, "custom persona");
        assert_eq!(history.len(), 5);
    }

    #[tokio::test]
    async fn search_answer_reaches_the_model() {
        let chat = model("True");
        let search = Arc::new(MockSearchProvider::answering("14:32 JST"));
        let qp = processor(chat.clone(), Some(search.clone()));

        let history = qp
            .process(
                "What time is it in Tokyo?",
                &ConversationHistory::new(),
                &settings(true),
            )
            .await
            .unwrap();

        assert_eq!(history.len(), 3);
        assert_eq!(search.queries(), vec!["What time is it in Tokyo?"]);

        let calls = chat.calls();
        assert_eq!(calls.len(), 2, "one classification + one completion");
        let sent = &calls[1];
        let user = sent.iter().find(|t| t.role == Role::User).unwrap();
        assert!(user.content.contains("What time is it in Tokyo?"));
        assert!(user.content.contains("14:32 JST"));
    }

    #[tokio::test]
    async fn search_not_required_skips_provider() {
        let search = Arc::new(MockSearchProvider::answering("unused"));
        let qp = processor(model("False"), Some(search.clone()));

        let history = qp
            .process("tell me a joke", &ConversationHistory::new(), &settings(true))
            .await
            .unwrap();

        assert!(search.queries().is_empty());
        assert_eq!(history.turns()[1], Turn::user("tell me a joke"));
    }

    #[tokio::test]
    async fn search_disabled_skips_classifier() {
        let chat = model("True");
        let search = Arc::new(MockSearchProvider::answering("unused"));
        let qp = processor(chat.clone(), Some(search.clone()));

        qp.process("news today", &ConversationHistory::new(), &settings(false))
            .await
            .unwrap();

        assert_eq!(chat.calls().len(), 1);
        assert!(search.queries().is_empty());
    }

    #[tokio::test]
    async fn no_answer_uses_query_verbatim() {
        let qp = processor(model("True"), Some(Arc::new(MockSearchProvider::empty())));
        let history = qp
            .process("obscure fact", &ConversationHistory::new(), &settings(true))
            .await
            .unwrap();
        assert_eq!(history.turns()[1], Turn::user("obscure fact"));
    }

    #[tokio::test]
    async fn search_failures_fail_open() {
        // Classifier fails, main completion works; provider fails too.
        let chat = Arc::new(MockChatModel::new(|turns| {
            if is_classification(turns) {
                Err(ChatError::Timeout)
            } else {
                Ok("fine".to_string())
            }
        }));
        let search = Arc::new(MockSearchProvider::failing());
        let qp = processor(chat, Some(search.clone()));

        let history = qp
            .process("weather in Oslo", &ConversationHistory::new(), &settings(true))
            .await
            .unwrap();

        assert_eq!(history.len(), 3);
        assert_eq!(history.turns()[1], Turn::user("weather in Oslo"));
        assert_eq!(history.last_reply(), Some("fine"));
        // Unavailable classifier means no search at all.
        assert!(search.queries().is_empty());
    }

    #[tokio::test]
    async fn provider_failure_after_positive_decision_fails_open() {
        let qp = processor(model("True"), Some(Arc::new(MockSearchProvider::failing())));
        let history = qp
            .process("weather in Oslo", &ConversationHistory::new(), &settings(true))
            .await
            .unwrap();
        assert_eq!(history.turns()[1], Turn::user("weather in Oslo"));
    }

    #[tokio::test]
    async fn model_failure_is_an_error_and_history_is_untouched() {
        let qp = processor(Arc::new(MockChatModel::failing()), None);
        let mut history = ConversationHistory::new();
        history.push_system("persona").unwrap();

        let err = qp
            .process("hello", &history, &settings(false))
            .await
            .unwrap_err();

        assert!(matches!(err, QueryError::Model(ChatError::Request(_))));
        assert!(err
            .to_string()
            .starts_with("An error occurred while processing your query:"));
        assert_eq!(history.len(), 1);
        assert_eq!(history.last_reply(), None);
    }
}
