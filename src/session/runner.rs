//! Session runner: the single event loop every mutation goes through.
//!
//! [`SessionRunner`] owns the [`SharedSession`] and responds to
//! [`SessionEvent`]s received over a `tokio::sync::mpsc` channel.  Service
//! calls run on spawned tasks and post their results back into the same
//! loop, so transcript mutations never interleave.
//!
//! # Event flow
//!
//! ```text
//! SessionEvent::Ask(text)
//!   └─▶ submit_question → spawn(dispatcher.call)          [Asking]
//!         └─▶ AnswerArrived → complete                     [Idle]
//!
//! SessionEvent::Upload(path)
//!   └─▶ spawn(upload.upload)
//!         ├─ Ok  → on_document_changed                     [Idle, empty]
//!         └─ Err → UploadFailed notice
//!
//! SessionEvent::Export { dir }
//!   └─▶ snapshot → spawn_blocking(export_to_dir)
//! ```
//!
//! Progress is reported to the front-end as [`SessionNotice`]s.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use crate::config::ExportConfig;
use crate::export::{self, ExportError};
use crate::service::{Answer, ServiceError, UploadReceipt, UploadService};

use super::controller::{AnswerDispatcher, AskRequest, Completion, SessionController};
use super::state::Document;

// ---------------------------------------------------------------------------
// SharedSession
// ---------------------------------------------------------------------------

/// Thread-safe handle to the [`SessionController`].
///
/// Front-ends lock it briefly to read snapshots; do **not** hold the lock
/// across `.await` points.
pub type SharedSession = Arc<Mutex<SessionController>>;

/// Wrap a controller for sharing between the runner and a front-end.
pub fn new_shared_session(controller: SessionController) -> SharedSession {
    Arc::new(Mutex::new(controller))
}

// ---------------------------------------------------------------------------
// Events and notices
// ---------------------------------------------------------------------------

/// Inputs from the front-end.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The user submitted a question.
    Ask(String),
    /// Re-ask the last question after it failed.
    Retry,
    /// Upload a local document; on success it becomes the active document.
    Upload(PathBuf),
    /// A document was processed elsewhere and is now active.
    DocumentChanged(Document),
    /// Write the transcript as a PDF into `dir`.
    Export { dir: PathBuf },
}

/// Progress reports for the front-end.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionNotice {
    /// A question was accepted and is in flight.
    QuestionAccepted { question: String },
    /// A question was rejected by the submission preconditions.
    QuestionIgnored,
    /// The in-flight question settled.
    AnswerApplied { completion: Completion },
    /// A response arrived for a session that has moved on.
    StaleDropped,
    /// An upload was started for `label`.
    UploadStarted { label: String },
    /// An upload was requested while another one was running.
    UploadIgnored,
    UploadFailed { message: String },
    /// A new document is active; the transcript is empty.
    DocumentChanged { label: String, message: String },
    Exported { path: PathBuf },
    ExportFailed { message: String },
}

/// Results posted back by spawned tasks.
enum TaskDone {
    Answer {
        request: AskRequest,
        outcome: Result<Answer, ServiceError>,
    },
    Upload {
        label: String,
        result: Result<UploadReceipt, ServiceError>,
    },
}

// ---------------------------------------------------------------------------
// SessionRunner
// ---------------------------------------------------------------------------

/// Drives one conversation session.
///
/// Create with [`SessionRunner::new`], then call [`run`](Self::run) inside
/// a tokio task.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use rag_notebook::config::AppConfig;
/// use rag_notebook::service::{HttpAnswerService, HttpUploadService};
/// use rag_notebook::session::{new_shared_session, SessionController, SessionEvent, SessionRunner};
///
/// # async fn example() {
/// let config = AppConfig::default();
/// let controller = SessionController::new(
///     config.session.clone(),
///     Arc::new(HttpAnswerService::from_config(&config.service)),
/// );
/// let session = new_shared_session(controller);
///
/// let (event_tx, event_rx) = tokio::sync::mpsc::channel(16);
/// let (notice_tx, _notice_rx) = tokio::sync::mpsc::channel(32);
/// let runner = SessionRunner::new(
///     Arc::clone(&session),
///     Arc::new(HttpUploadService::from_config(&config.service)),
///     config.export.clone(),
///     notice_tx,
/// );
/// tokio::spawn(runner.run(event_rx));
///
/// event_tx.send(SessionEvent::Upload("report.pdf".into())).await.unwrap();
/// # }
/// ```
pub struct SessionRunner {
    session: SharedSession,
    upload: Arc<dyn UploadService>,
    export: ExportConfig,
    notices: mpsc::Sender<SessionNotice>,
    done_tx: mpsc::Sender<TaskDone>,
    done_rx: mpsc::Receiver<TaskDone>,
    /// Spawned tasks whose result has not been handled yet.
    in_flight: usize,
    uploading: bool,
}

impl SessionRunner {
    /// Create a new runner.
    ///
    /// # Arguments
    ///
    /// * `session`: shared controller (also read by the front-end).
    /// * `upload`: Upload Service (e.g. `HttpUploadService`).
    /// * `export`: page layout for transcript exports.
    /// * `notices`: channel the front-end listens on.
    pub fn new(
        session: SharedSession,
        upload: Arc<dyn UploadService>,
        export: ExportConfig,
        notices: mpsc::Sender<SessionNotice>,
    ) -> Self {
        let (done_tx, done_rx) = mpsc::channel(16);
        Self {
            session,
            upload,
            export,
            notices,
            done_tx,
            done_rx,
            in_flight: 0,
            uploading: false,
        }
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run until `events` is closed and every spawned call has reported
    /// back.
    pub async fn run(mut self, mut events: mpsc::Receiver<SessionEvent>) {
        let mut events_open = true;

        loop {
            if !events_open && self.in_flight == 0 {
                break;
            }

            tokio::select! {
                biased;

                event = events.recv(), if events_open => match event {
                    Some(event) => self.handle_event(event).await,
                    None => events_open = false,
                },
                Some(done) = self.done_rx.recv(), if self.in_flight > 0 => {
                    self.in_flight -= 1;
                    self.handle_done(done).await;
                }
                else => break,
            }
        }

        log::info!("session: event channel closed, runner shutting down");
    }

    // -----------------------------------------------------------------------
    // Event handlers
    // -----------------------------------------------------------------------

    async fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Ask(text) => {
                let (request, dispatcher) = {
                    let mut session = self.lock();
                    (session.submit_question(&text), session.dispatcher())
                };
                self.dispatch(request, dispatcher).await;
            }
            SessionEvent::Retry => {
                let (request, dispatcher) = {
                    let mut session = self.lock();
                    (session.retry_last(), session.dispatcher())
                };
                self.dispatch(request, dispatcher).await;
            }
            SessionEvent::Upload(path) => self.start_upload(path).await,
            SessionEvent::DocumentChanged(document) => {
                let label = document.label.clone();
                self.lock().on_document_changed(document);
                self.notify(SessionNotice::DocumentChanged {
                    label,
                    message: String::new(),
                })
                .await;
            }
            SessionEvent::Export { dir } => self.export_to(dir).await,
        }
    }

    async fn handle_done(&mut self, done: TaskDone) {
        match done {
            TaskDone::Answer { request, outcome } => {
                let completion = self.lock().complete(&request, outcome);
                let notice = match completion {
                    Completion::Stale => SessionNotice::StaleDropped,
                    completion => SessionNotice::AnswerApplied { completion },
                };
                self.notify(notice).await;
            }
            TaskDone::Upload { label, result } => {
                self.uploading = false;
                match result {
                    Ok(receipt) => {
                        log::info!("session: uploaded {label:?} as {:?}", receipt.document_id);
                        self.lock()
                            .on_document_changed(Document::new(receipt.document_id, label.clone()));
                        self.notify(SessionNotice::DocumentChanged {
                            label,
                            message: receipt.message,
                        })
                        .await;
                    }
                    Err(e) => {
                        log::warn!("session: upload of {label:?} failed: {e}");
                        self.notify(SessionNotice::UploadFailed {
                            message: e.detail(),
                        })
                        .await;
                    }
                }
            }
        }
    }

    async fn dispatch(&mut self, request: Option<AskRequest>, dispatcher: AnswerDispatcher) {
        let Some(request) = request else {
            self.notify(SessionNotice::QuestionIgnored).await;
            return;
        };

        let question = request.question.question.clone();
        let done_tx = self.done_tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let outcome = dispatcher.call(&request).await;
            let _ = done_tx.send(TaskDone::Answer { request, outcome }).await;
        });

        self.notify(SessionNotice::QuestionAccepted { question }).await;
    }

    async fn start_upload(&mut self, path: PathBuf) {
        if self.uploading {
            log::warn!("session: upload already in progress, ignoring {}", path.display());
            self.notify(SessionNotice::UploadIgnored).await;
            return;
        }

        let label = document_label(&path);
        let upload = Arc::clone(&self.upload);
        let done_tx = self.done_tx.clone();
        self.uploading = true;
        self.in_flight += 1;
        {
            let label = label.clone();
            tokio::spawn(async move {
                let result = upload.upload(&path).await;
                let _ = done_tx.send(TaskDone::Upload { label, result }).await;
            });
        }

        self.notify(SessionNotice::UploadStarted { label }).await;
    }

    async fn export_to(&mut self, dir: PathBuf) {
        let (turns, label) = {
            let session = self.lock();
            (
                session.transcript(),
                session.active_document().map(|d| d.label.clone()),
            )
        };
        let layout = self.export.clone();

        let result = tokio::task::spawn_blocking(move || {
            export::export_to_dir(&turns, label.as_deref(), &layout, &dir)
        })
        .await
        .unwrap_or_else(|e| Err(ExportError::Io(std::io::Error::other(e.to_string()))));

        let notice = match result {
            Ok(path) => {
                log::info!("session: exported transcript to {}", path.display());
                SessionNotice::Exported { path }
            }
            Err(e) => {
                log::warn!("session: export rejected: {e}");
                SessionNotice::ExportFailed {
                    message: e.to_string(),
                }
            }
        };
        self.notify(notice).await;
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn lock(&self) -> MutexGuard<'_, SessionController> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn notify(&self, notice: SessionNotice) {
        let _ = self.notices.send(notice).await;
    }
}

/// Display label for an uploaded file: its file name.
fn document_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
