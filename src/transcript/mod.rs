//! Transcript store: the ordered log of conversation turns.
//!
//! * [`Turn`] / [`Speaker`]: one exchange unit and who produced it.
//! * [`TranscriptStore`]: settled turns plus a single pending slot for the
//!   in-flight Assistant placeholder.
//! * [`TranscriptError`]: misuse of the store (a programming fault).
//!
//! Only the session controller mutates a store; everyone else reads
//! snapshots from [`TranscriptStore::read_all`].

pub mod store;
pub mod turn;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use store::{TranscriptError, TranscriptStore};
pub use turn::{Speaker, Turn};
