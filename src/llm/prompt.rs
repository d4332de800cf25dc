//! Prompt text for the assistant persona and the search classifier.
//!
//! * [`system_prompt`] opens every new conversation.
//! * [`SEARCH_DECISION_INSTRUCTION`] drives the True/False web-search
//!   classification.
//! * [`with_search_results`] folds a web-search answer into a user query.

use chrono::NaiveDateTime;

// ---------------------------------------------------------------------------
// Search classification
// ---------------------------------------------------------------------------

/// System instruction for the forced-choice "does this need the web?" call.
pub const SEARCH_DECISION_INSTRUCTION: &str = "\
You are a helpful assistant. Respond with 'True' if a web search is required \
to answer the user's query and 'False' otherwise. Provide no additional information.";

// ---------------------------------------------------------------------------
// Persona
// ---------------------------------------------------------------------------

/// Build the system turn that opens a conversation.
///
/// # Example
/// ```rust
/// use chrono::NaiveDate;
/// use vocal_assistant::llm::prompt::system_prompt;
///
/// let now = NaiveDate::from_ymd_opt(2024, 5, 1)
///     .unwrap()
///     .and_hms_opt(9, 30, 0)
///     .unwrap();
/// let prompt = system_prompt("Pi", "Lyon - France", now);
/// assert!(prompt.contains("named Pi"));
/// assert!(prompt.contains("2024-05-01"));
/// assert!(prompt.contains("09:30:00"));
/// ```
pub fn system_prompt(assistant_name: &str, location: &str, now: NaiveDateTime) -> String {
    format!(
        "You are a helpful personal vocal assistant named {assistant_name}. \
         Your location is {location}. The date is {date} and the time is {time}. \
         Respond to the user's query in a friendly way. \
         Please make your response only of text (without any images, emojis and so on). \
         Your response should be no longer than two sentences.",
        date = now.format("%Y-%m-%d"),
        time = now.format("%H:%M:%S"),
    )
}

// ---------------------------------------------------------------------------
// Augmentation
// ---------------------------------------------------------------------------

/// Append a delimited web-search block to `query`.
pub fn with_search_results(query: &str, results: &str) -> String {
    format!("{query}\n\nHere is some information from the web search: {results}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
