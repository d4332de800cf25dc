//! Session states and the outcome of one utterance.

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// ```text
/// Dormant ──wake phrase──▶ Active
/// Active  ──query──────────▶ Active   (reply spoken)
/// Active  ──sleep phrase / silence──▶ Dormant (history cleared)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Only the wake phrase is listened for.
    #[default]
    Dormant,
    /// Every utterance is a query until the sleep phrase or a timeout.
    Active,
}

impl SessionState {
    pub fn is_active(self) -> bool {
        self == SessionState::Active
    }

    pub fn label(self) -> &'static str {
        match self {
            SessionState::Dormant => "dormant",
            SessionState::Active => "active",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// What handling one utterance did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Nothing changed.
    Ignored,
    /// Dormant → Active.
    Activated,
    /// Active → Dormant; the conversation was forgotten.
    Deactivated,
    /// A query was answered with this text.
    Replied(String),
    /// A query could not be answered; carries the error description.
    Failed(String),
}

/// Case-insensitive substring match.  An empty phrase never matches.
///
/// ```
/// use vocal_assistant::session::contains_phrase;
///
/// assert!(contains_phrase("Hey Assistant, what's up", "hey assistant"));
/// assert!(!contains_phrase("hello", ""));
/// ```
pub fn contains_phrase(utterance: &str, phrase: &str) -> bool {
    let phrase = phrase.trim();
    !phrase.is_empty() && utterance.to_lowercase().contains(&phrase.to_lowercase())
}
