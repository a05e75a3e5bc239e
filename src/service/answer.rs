//! Answer Service contract.

use async_trait::async_trait;
use serde::Deserialize;

use crate::transcript::Turn;

use super::ServiceError;

// ---------------------------------------------------------------------------
// Question / Answer
// ---------------------------------------------------------------------------

/// One question about one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    /// Identifier returned by the Upload Service.
    pub document_id: String,
    /// Trimmed question text.
    pub question: String,
    /// Earlier settled turns, oldest first.  Empty unless history replay is
    /// enabled.
    pub history: Vec<Turn>,
}

impl Question {
    pub fn new(document_id: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            question: question.into(),
            history: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: Vec<Turn>) -> Self {
        self.history = history;
        self
    }
}

/// A successful answer.
///
/// `sources` is never absent: a response without the field deserialises to
/// an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Answer {
    pub answer: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sources: Vec<String>,
}

impl Answer {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            sources: Vec::new(),
        }
    }

    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let sources: Option<Vec<String>> = Option::deserialize(deserializer)?;
    Ok(sources.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// AnswerService trait
// ---------------------------------------------------------------------------

/// Async trait for anything that can answer a [`Question`].
///
/// Implementors must be `Send + Sync` so they can be shared across tasks
/// behind an `Arc<dyn AnswerService>`.
#[async_trait]
pub trait AnswerService: Send + Sync {
    async fn ask(&self, question: &Question) -> Result<Answer, ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sources_default_to_empty() {
        let answer: Answer = serde_json::from_str(r#"{"answer":"Topic is Z"}"#).unwrap();
        assert_eq!(answer.answer, "Topic is Z");
        assert!(answer.sources.is_empty());
    }

    #[test]
    fn null_sources_default_to_empty() {
        let answer: Answer =
            serde_json::from_str(r#"{"answer":"Topic is Z","sources":null}"#).unwrap();
        assert!(answer.sources.is_empty());
    }

    #[test]
    fn sources_keep_their_order() {
        let answer: Answer =
            serde_json::from_str(r#"{"answer":"a","sources":["chunk2","chunk1"]}"#).unwrap();
        assert_eq!(answer.sources, ["chunk2", "chunk1"]);
    }

    #[test]
    fn missing_answer_is_an_error() {
        assert!(serde_json::from_str::<Answer>(r#"{"sources":[]}"#).is_err());
    }
}
