//! Conversation session: the controller state machine and its event loop.
//!
//! This module wires the ask / answer lifecycle and exposes the shared
//! state a front-end reads.
//!
//! # Architecture
//!
//! ```text
//! SessionEvent (mpsc)
//!        │
//!        ▼
//! SessionRunner::run()  ← async tokio task
//!        │
//!        ├─ Ask(text)        → SessionController::submit_question
//!        │                     └─ spawn(AnswerDispatcher::call) ─┐
//!        │                                                       │
//!        ├─ TaskDone::Answer ◀─────────────────────────────────────┘
//!        │                  → SessionController::complete
//!        │
//!        ├─ Upload(path)     → spawn(UploadService::upload)
//!        │                     └─ on_document_changed
//!        │
//!        └─ Export { dir }   → export::export_to_dir (blocking pool)
//!
//! SharedSession (Arc<Mutex<SessionController>>) ←── read by the front-end
//! SessionNotice (mpsc)                            ──▶ front-end
//! ```

pub mod controller;
pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use controller::{error_message, AnswerDispatcher, AskRequest, Completion, SessionController};
pub use runner::{new_shared_session, SessionEvent, SessionNotice, SessionRunner, SharedSession};
pub use state::{Document, SessionState, SessionStatus};
