//! Ordered turn log with a single pending slot.
//!
//! Settled turns live in a `Vec`; the in-flight Assistant placeholder lives
//! in its own `Option` slot that is always logically last.  Replacing the
//! placeholder is therefore a `take()` of the slot followed by a push, with
//! no index arithmetic on the settled list.

use thiserror::Error;

use super::turn::Turn;

// ---------------------------------------------------------------------------
// TranscriptError
// ---------------------------------------------------------------------------

/// Misuse of a [`TranscriptStore`].
///
/// The session controller's state machine never triggers these; seeing one
/// means a caller broke the placeholder protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptError {
    #[error("transcript invariant violated: {0}")]
    InvariantViolation(&'static str),
}

// ---------------------------------------------------------------------------
// TranscriptStore
// ---------------------------------------------------------------------------

/// Append-only-with-in-place-edit log of conversation turns.
///
/// # Example
/// ```rust
/// use rag_notebook::transcript::{Turn, TranscriptStore};
///
/// let mut store = TranscriptStore::new();
/// store.append(Turn::user("What is X?")).unwrap();
/// store.append(Turn::placeholder("Thinking...")).unwrap();
/// store.replace_last(Turn::assistant("X is Y.")).unwrap();
///
/// let turns = store.read_all();
/// assert_eq!(turns.len(), 2);
/// assert!(!store.has_placeholder());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TranscriptStore {
    settled: Vec<Turn>,
    pending: Option<Turn>,
}

impl TranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `turn` at the end of the transcript.
    ///
    /// # Errors
    ///
    /// `InvariantViolation` when a placeholder is already pending: nothing
    /// may be appended after it, and a second placeholder would stack.
    pub fn append(&mut self, turn: Turn) -> Result<(), TranscriptError> {
        if self.pending.is_some() {
            return Err(TranscriptError::InvariantViolation(
                "cannot append while a placeholder is pending",
            ));
        }
        if turn.is_placeholder {
            self.pending = Some(turn);
        } else {
            self.settled.push(turn);
        }
        Ok(())
    }

    /// Replace the pending placeholder with a settled turn.
    ///
    /// # Errors
    ///
    /// `InvariantViolation` when the last turn is not a placeholder, or when
    /// `turn` is itself a placeholder.
    pub fn replace_last(&mut self, turn: Turn) -> Result<(), TranscriptError> {
        if turn.is_placeholder {
            return Err(TranscriptError::InvariantViolation(
                "a placeholder cannot replace a placeholder",
            ));
        }
        if self.pending.take().is_none() {
            return Err(TranscriptError::InvariantViolation(
                "last turn is not a placeholder",
            ));
        }
        self.settled.push(turn);
        Ok(())
    }

    /// Remove and return the last turn (the placeholder, if one is pending).
    pub fn remove_last(&mut self) -> Option<Turn> {
        self.pending.take().or_else(|| self.settled.pop())
    }

    /// Owned snapshot of every turn in conversation order.
    pub fn read_all(&self) -> Vec<Turn> {
        let mut turns = Vec::with_capacity(self.len());
        turns.extend(self.settled.iter().cloned());
        turns.extend(self.pending.iter().cloned());
        turns
    }

    /// Settled turns only, excluding any pending placeholder.
    pub fn settled(&self) -> &[Turn] {
        &self.settled
    }

    pub fn last(&self) -> Option<&Turn> {
        self.pending.as_ref().or_else(|| self.settled.last())
    }

    pub fn has_placeholder(&self) -> bool {
        self.pending.is_some()
    }

    pub fn len(&self) -> usize {
        self.settled.len() + usize::from(self.pending.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every turn, including a pending placeholder.
    pub fn clear(&mut self) {
        self.settled.clear();
        self.pending = None;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Speaker;

    fn with_pending() -> TranscriptStore {
        let mut store = TranscriptStore::new();
        store.append(Turn::user("q")).unwrap();
        store.append(Turn::placeholder("Thinking...")).unwrap();
        store
    }

    #[test]
    fn new_store_is_empty() {
        let store = TranscriptStore::new();
        assert!(store.is_empty());
        assert!(store.last().is_none());
        assert!(!store.has_placeholder());
    }

    #[test]
    fn read_all_preserves_order_and_puts_placeholder_last() {
        let mut store = TranscriptStore::new();
        store.append(Turn::user("one")).unwrap();
        store.append(Turn::assistant("two")).unwrap();
        store.append(Turn::user("three")).unwrap();
        store.append(Turn::placeholder("...")).unwrap();

        let turns = store.read_all();
        let contents: Vec<&str> = turns.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, ["one", "two", "three", "..."]);
        assert!(turns[3].is_placeholder);
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn snapshot_does_not_alias_the_store() {
        let mut store = with_pending();
        let snapshot = store.read_all();

        store.replace_last(Turn::assistant("answer")).unwrap();

        assert!(snapshot[1].is_placeholder);
        assert!(!store.read_all()[1].is_placeholder);
    }

    #[test]
    fn replace_last_swaps_placeholder() {
        let mut store = with_pending();
        store.replace_last(Turn::assistant("answer")).unwrap();

        assert!(!store.has_placeholder());
        let last = store.last().unwrap();
        assert_eq!(last.speaker, Speaker::Assistant);
        assert_eq!(last.content, "answer");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn replace_last_without_placeholder_is_invariant_violation() {
        let mut store = TranscriptStore::new();
        store.append(Turn::user("q")).unwrap();

        let err = store.replace_last(Turn::assistant("a")).unwrap_err();
        assert!(matches!(err, TranscriptError::InvariantViolation(_)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn replace_last_with_placeholder_is_rejected() {
        let mut store = with_pending();
        let err = store.replace_last(Turn::placeholder("again")).unwrap_err();
        assert!(matches!(err, TranscriptError::InvariantViolation(_)));
        assert!(store.has_placeholder());
    }

    #[test]
    fn second_placeholder_cannot_stack() {
        let mut store = with_pending();
        assert!(store.append(Turn::placeholder("again")).is_err());
        assert!(store.append(Turn::user("next")).is_err());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn remove_last_takes_placeholder_first() {
        let mut store = with_pending();

        let removed = store.remove_last().unwrap();
        assert!(removed.is_placeholder);
        let removed = store.remove_last().unwrap();
        assert_eq!(removed.content, "q");
        assert!(store.remove_last().is_none());
    }

    #[test]
    fn clear_drops_pending_slot() {
        let mut store = with_pending();
        store.clear();
        assert!(store.is_empty());
        assert!(store.append(Turn::user("fresh")).is_ok());
    }

    #[test]
    fn settled_excludes_placeholder() {
        let store = with_pending();
        assert_eq!(store.settled().len(), 1);
        assert_eq!(store.read_all().len(), 2);
    }
}
