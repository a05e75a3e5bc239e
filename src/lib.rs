//! RAG Notebook: conversational question answering over an uploaded document.
//!
//! The crate is organised leaves first:
//!
//! * [`config`]: `settings.toml` persistence and platform paths.
//! * [`transcript`]: ordered turn log with a single pending slot.
//! * [`service`]: Upload / Answer service traits and HTTP clients.
//! * [`session`]: the session controller state machine and its event loop.
//! * [`export`]: paginated PDF export of the transcript.

pub mod config;
pub mod export;
pub mod service;
pub mod session;
pub mod transcript;
