//! A single conversation turn.

// ---------------------------------------------------------------------------
// Speaker
// ---------------------------------------------------------------------------

/// Who produced a [`Turn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    /// Label printed above the turn in displays and exports.
    ///
    /// ```
    /// use rag_notebook::transcript::Speaker;
    ///
    /// assert_eq!(Speaker::User.label(), "You");
    /// assert_eq!(Speaker::Assistant.label(), "AI");
    /// ```
    pub fn label(&self) -> &'static str {
        match self {
            Speaker::User => "You",
            Speaker::Assistant => "AI",
        }
    }
}

// ---------------------------------------------------------------------------
// Turn
// ---------------------------------------------------------------------------

/// One exchange unit in the transcript.
///
/// Build turns through the constructors so the flag combinations stay
/// meaningful: only Assistant turns are ever placeholders or errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub speaker: Speaker,
    /// Text of the turn.  Holds the "thinking" indicator while
    /// `is_placeholder` is set.
    pub content: String,
    /// `true` only for an Assistant turn awaiting a response.
    pub is_placeholder: bool,
    /// `true` when the turn records a failed attempt.
    pub is_error: bool,
}

impl Turn {
    /// A question typed by the user.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            content: content.into(),
            is_placeholder: false,
            is_error: false,
        }
    }

    /// A settled answer from the Answer Service.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            content: content.into(),
            is_placeholder: false,
            is_error: false,
        }
    }

    /// The transient turn shown while a question is in flight.
    pub fn placeholder(indicator: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            content: indicator.into(),
            is_placeholder: true,
            is_error: false,
        }
    }

    /// An Assistant turn describing a failed attempt.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            content: message.into(),
            is_placeholder: false,
            is_error: true,
        }
    }

    /// `true` for turns worth replaying as conversation context: neither
    /// placeholders nor errors.
    pub fn counts_as_history(&self) -> bool {
        !self.is_placeholder && !self.is_error
    }
}
