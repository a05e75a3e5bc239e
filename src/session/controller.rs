//! Session controller: turns questions into an ordered, mutable transcript.
//!
//! [`SessionController`] owns the [`TranscriptStore`] and the
//! [`SessionState`].  It is a synchronous state machine; the one suspension
//! point (the Answer Service call) is split out so an event loop can run it
//! on another task:
//!
//! ```text
//! submit_question(text)
//!   └─▶ append User turn + placeholder, status = Asking   → AskRequest
//!
//! AnswerDispatcher::call(&request)                         (async, timed)
//!
//! complete(&request, outcome)
//!   ├─ request no longer current → dropped               [Stale]
//!   ├─ Ok(answer) → placeholder ⇒ answer, sources kept   [Answered]
//!   └─ Err(e)     → placeholder ⇒ error turn             [Failed]
//! ```
//!
//! Every request is tagged with the document id it was asked against and a
//! per-session sequence number.  A document change forgets the request in
//! flight, so its eventual result is discarded instead of landing in the
//! fresh transcript.

use std::sync::Arc;
use std::time::Duration;

use crate::config::SessionConfig;
use crate::service::{Answer, AnswerService, Question, ServiceError};
use crate::transcript::{Speaker, TranscriptStore, Turn};

use super::state::{Document, SessionState, SessionStatus};

// ---------------------------------------------------------------------------
// AskRequest / Completion
// ---------------------------------------------------------------------------

/// An accepted question, tagged with the session context it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct AskRequest {
    pub question: Question,
    seq: u64,
}

impl AskRequest {
    /// Document the question was asked against.
    pub fn document_id(&self) -> &str {
        &self.question.document_id
    }
}

/// What [`SessionController::complete`] did with an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The placeholder was replaced with the answer.
    Answered,
    /// The placeholder was replaced with an error turn.
    Failed,
    /// The request no longer belongs to this session; nothing changed.
    Stale,
}

// ---------------------------------------------------------------------------
// AnswerDispatcher
// ---------------------------------------------------------------------------

/// Runs an [`AskRequest`] against the Answer Service under a timeout.
///
/// Cheap to clone; holds no session state, so it can be moved onto a
/// spawned task while the controller keeps handling events.
#[derive(Clone)]
pub struct AnswerDispatcher {
    service: Arc<dyn AnswerService>,
    timeout: Duration,
}

impl AnswerDispatcher {
    pub async fn call(&self, request: &AskRequest) -> Result<Answer, ServiceError> {
        match tokio::time::timeout(self.timeout, self.service.ask(&request.question)).await {
            Ok(result) => result,
            Err(_) => Err(ServiceError::Timeout),
        }
    }
}

/// Text of the error turn for a failed question.
pub fn error_message(err: &ServiceError) -> String {
    format!("Error: Failed to get an answer. {}", err.detail())
}

// ---------------------------------------------------------------------------
// SessionController
// ---------------------------------------------------------------------------

/// Orchestrates the ask / answer lifecycle for one document session.
///
/// # Example
/// ```rust,no_run
/// use std::sync::Arc;
/// use rag_notebook::config::AppConfig;
/// use rag_notebook::service::HttpAnswerService;
/// use rag_notebook::session::{Document, SessionController};
///
/// # async fn example() {
/// let config = AppConfig::default();
/// let answer = Arc::new(HttpAnswerService::from_config(&config.service));
/// let mut session = SessionController::new(config.session.clone(), answer);
///
/// session.on_document_changed(Document::new("report.pdf", "report.pdf"));
/// session.ask("What is the topic?").await;
///
/// for turn in session.transcript() {
///     println!("{}: {}", turn.speaker.label(), turn.content);
/// }
/// # }
/// ```
pub struct SessionController {
    state: SessionState,
    transcript: TranscriptStore,
    dispatcher: AnswerDispatcher,
    config: SessionConfig,
    /// Sequence number of the request whose placeholder is pending.
    in_flight: Option<u64>,
    next_seq: u64,
}

impl SessionController {
    /// Create an idle session with no active document.
    ///
    /// # Arguments
    ///
    /// * `config`: placeholder text, history replay and answer timeout.
    /// * `answer`: the Answer Service (e.g. `HttpAnswerService`).
    pub fn new(config: SessionConfig, answer: Arc<dyn AnswerService>) -> Self {
        let dispatcher = AnswerDispatcher {
            service: answer,
            timeout: config.answer_timeout(),
        };
        Self {
            state: SessionState::default(),
            transcript: TranscriptStore::new(),
            dispatcher,
            config,
            in_flight: None,
            next_seq: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status
    }

    pub fn active_document(&self) -> Option<&Document> {
        self.state.active_document.as_ref()
    }

    pub fn last_sources(&self) -> &[String] {
        &self.state.last_sources
    }

    /// Snapshot of the transcript in conversation order.
    pub fn transcript(&self) -> Vec<Turn> {
        self.transcript.read_all()
    }

    pub fn dispatcher(&self) -> AnswerDispatcher {
        self.dispatcher.clone()
    }

    /// Whether [`submit_question`](Self::submit_question) would accept
    /// `text` right now.  Front-ends use it to disable their submit control.
    pub fn can_submit(&self, text: &str) -> bool {
        self.state.active_document.is_some()
            && !text.trim().is_empty()
            && self.state.status == SessionStatus::Idle
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Accept a question: append the User turn and the placeholder, enter
    /// `Asking`, clear the previous sources.
    ///
    /// Returns `None` without touching any state when there is no active
    /// document, the trimmed text is empty, or a question is already in
    /// flight.
    pub fn submit_question(&mut self, text: &str) -> Option<AskRequest> {
        if !self.can_submit(text) {
            log::debug!(
                "session: question ignored (status={}, document={})",
                self.state.status.label(),
                self.state.active_document.is_some()
            );
            return None;
        }
        let document = self.state.active_document.as_ref()?;
        let question = text.trim().to_string();

        let history = if self.config.send_history {
            self.history()
        } else {
            Vec::new()
        };
        let request = AskRequest {
            question: Question::new(document.id.clone(), question.clone()).with_history(history),
            seq: self.next_seq,
        };

        if let Err(e) = self
            .transcript
            .append(Turn::user(question.clone()))
            .and_then(|()| {
                self.transcript
                    .append(Turn::placeholder(self.config.thinking_indicator.clone()))
            })
        {
            log::error!("session: {e}");
            return None;
        }

        self.next_seq += 1;
        self.in_flight = Some(request.seq);
        self.state.status = SessionStatus::Asking;
        self.state.pending_question = Some(question);
        self.state.last_sources.clear();

        log::debug!("session: Idle → Asking (request #{})", request.seq);
        Some(request)
    }

    /// Apply the outcome of `request` to the transcript.
    ///
    /// Outcomes for requests that are no longer current (the document
    /// changed since submission) are dropped and reported as
    /// [`Completion::Stale`].
    pub fn complete(
        &mut self,
        request: &AskRequest,
        outcome: Result<Answer, ServiceError>,
    ) -> Completion {
        let current_document = self.state.active_document.as_ref().map(|d| d.id.as_str());
        if self.in_flight != Some(request.seq) || current_document != Some(request.document_id()) {
            log::warn!(
                "session: dropping stale response for request #{} (document {})",
                request.seq,
                request.document_id()
            );
            return Completion::Stale;
        }

        let (turn, sources, completion) = match outcome {
            Ok(answer) => (Turn::assistant(answer.answer), answer.sources, Completion::Answered),
            Err(e) => {
                log::warn!("session: answer service failed: {e}");
                (Turn::error(error_message(&e)), Vec::new(), Completion::Failed)
            }
        };

        if let Err(e) = self.transcript.replace_last(turn) {
            log::error!("session: {e}");
        }

        self.in_flight = None;
        self.state.status = SessionStatus::Idle;
        self.state.pending_question = None;
        self.state.last_sources = sources;

        log::debug!("session: Asking → Idle ({completion:?})");
        completion
    }

    /// Submit `text`, wait for the Answer Service and apply the outcome.
    ///
    /// Returns `None` when the question was not accepted.
    pub async fn ask(&mut self, text: &str) -> Option<Completion> {
        let request = self.submit_question(text)?;
        let outcome = self.dispatcher.call(&request).await;
        Some(self.complete(&request, outcome))
    }

    /// Ask the last question again after it failed.
    ///
    /// Removes the error turn and the question it answered, then resubmits
    /// the same text.  Returns `None` unless the session is idle and the
    /// last turn is an error.
    pub fn retry_last(&mut self) -> Option<AskRequest> {
        if self.state.status.is_busy() || !self.transcript.last().is_some_and(|t| t.is_error) {
            return None;
        }
        let settled = self.transcript.settled();
        let question_turn = settled.len().checked_sub(2).map(|i| &settled[i])?;
        if question_turn.speaker != Speaker::User {
            return None;
        }
        let question = question_turn.content.clone();

        self.transcript.remove_last();
        self.transcript.remove_last();
        log::debug!("session: retrying {question:?}");
        self.submit_question(&question)
    }

    /// Switch to a newly processed document, discarding the conversation.
    ///
    /// Any question in flight is forgotten; its response will be dropped as
    /// stale when it arrives.
    pub fn on_document_changed(&mut self, document: Document) {
        if let Some(seq) = self.in_flight.take() {
            log::info!("session: document changed with request #{seq} in flight");
        }
        log::info!("session: active document is now {:?}", document.label);

        self.transcript.clear();
        self.state = SessionState {
            active_document: Some(document),
            ..SessionState::default()
        };
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Settled question/answer pairs worth replaying, oldest first.
    ///
    /// A failed exchange is left out entirely so the service never sees a
    /// question without its answer.
    fn history(&self) -> Vec<Turn> {
        self.transcript
            .settled()
            .chunks(2)
            .filter(|pair| pair.len() == 2 && pair.iter().all(Turn::counts_as_history))
            .flatten()
            .cloned()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
