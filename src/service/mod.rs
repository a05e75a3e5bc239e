//! External collaborators: the Upload and Answer services.
//!
//! This module provides:
//! * [`AnswerService`]: async trait answering a question about a document.
//! * [`UploadService`]: async trait turning a local file into a document id.
//! * [`HttpAnswerService`] / [`HttpUploadService`]: `reqwest` clients for the
//!   RAG backend (`POST /ask-doc`, `POST /process-docs`).
//! * [`ServiceError`]: every way a service call can fail.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use rag_notebook::config::AppConfig;
//! use rag_notebook::service::{AnswerService, HttpAnswerService, Question};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let service = HttpAnswerService::from_config(&config.service);
//!
//!     let question = Question::new("report.pdf", "What is the topic?");
//!     match service.ask(&question).await {
//!         Ok(answer) => println!("{} ({} sources)", answer.answer, answer.sources.len()),
//!         Err(e) => eprintln!("{}", e.detail()),
//!     }
//! }
//! ```

pub mod answer;
pub mod error;
pub mod http;
pub mod upload;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use answer::{Answer, AnswerService, Question};
pub use error::ServiceError;
pub use http::{HttpAnswerService, HttpUploadService};
pub use upload::{UploadReceipt, UploadService};
