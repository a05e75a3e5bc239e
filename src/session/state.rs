//! Session status and the state the controller exposes to readers.
//!
//! [`SessionStatus`] is the controller's two-state machine.  [`SessionState`]
//! is everything a display needs besides the transcript itself: the active
//! document, the question in flight, and the sources behind the last answer.

// ---------------------------------------------------------------------------
// SessionStatus
// ---------------------------------------------------------------------------

/// States of the conversation session.
///
/// ```text
/// Idle ──submit_question──▶ Asking ──answer / failure──▶ Idle
/// any  ──document changed──────────────────────────────▶ Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// Ready for the next question.
    #[default]
    Idle,
    /// A question is in flight; further submissions are ignored.
    Asking,
}

impl SessionStatus {
    /// `true` while a question is in flight.
    ///
    /// ```
    /// use rag_notebook::session::SessionStatus;
    ///
    /// assert!(!SessionStatus::Idle.is_busy());
    /// assert!(SessionStatus::Asking.is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        matches!(self, SessionStatus::Asking)
    }

    /// Short label for a status line.
    pub fn label(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "Idle",
            SessionStatus::Asking => "Searching...",
        }
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// A successfully processed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Identifier the Answer Service knows the document by.
    pub id: String,
    /// Display name, usually the uploaded file name.
    pub label: String,
}

impl Document {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Per-session state owned by the controller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    /// Document questions are asked against.  `None` until the first upload.
    pub active_document: Option<Document>,
    /// Trimmed text of the question in flight.
    pub pending_question: Option<String>,
    pub status: SessionStatus,
    /// Source snippets returned with the most recent successful answer.
    pub last_sources: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_idle_and_empty() {
        let state = SessionState::default();
        assert_eq!(state.status, SessionStatus::Idle);
        assert!(state.active_document.is_none());
        assert!(state.pending_question.is_none());
        assert!(state.last_sources.is_empty());
    }

    #[test]
    fn labels() {
        assert_eq!(SessionStatus::Idle.label(), "Idle");
        assert_eq!(SessionStatus::Asking.label(), "Searching...");
    }
}
