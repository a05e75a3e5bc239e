//! Application entry point: RAG Notebook console.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (writes the defaults on first run).
//! 3. Create the [`tokio`] runtime.
//! 4. Build the upload and answer services from config.
//! 5. Build the session controller and wrap it for sharing.
//! 6. Spawn the [`SessionRunner`] and the notice printer.
//! 7. Read commands from stdin until `:quit` or end of input.
//!
//! # Commands
//!
//! ```text
//! :upload <path>   upload a document and make it active
//! :export [dir]    write the transcript as a PDF
//! :retry           re-ask the last failed question
//! :sources         show the sources of the last answer
//! :quit            exit
//! anything else    ask a question about the active document
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use rag_notebook::{
    config::AppConfig,
    service::{HttpAnswerService, HttpUploadService},
    session::{
        new_shared_session, Completion, SessionController, SessionEvent, SessionNotice,
        SessionRunner, SharedSession,
    },
    transcript::Turn,
};

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq)]
enum Command {
    Event(SessionEvent),
    Sources,
    Quit,
    Nothing,
}

fn parse_command(line: &str, default_export_dir: &Path) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Nothing;
    }

    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    match head {
        ":quit" | ":q" => Command::Quit,
        ":sources" => Command::Sources,
        ":retry" => Command::Event(SessionEvent::Retry),
        ":upload" if rest.is_empty() => Command::Nothing,
        ":upload" => Command::Event(SessionEvent::Upload(PathBuf::from(rest))),
        ":export" => {
            let dir = if rest.is_empty() {
                default_export_dir.to_path_buf()
            } else {
                PathBuf::from(rest)
            };
            Command::Event(SessionEvent::Export { dir })
        }
        _ => Command::Event(SessionEvent::Ask(line.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn turn_line(turn: &Turn) -> String {
    format!("{}: {}", turn.speaker.label(), turn.content)
}

/// Console lines for one notice, reading the latest transcript state from
/// `session` where the notice refers to it.
fn notice_lines(notice: SessionNotice, session: &SessionController) -> Vec<String> {
    match notice {
        SessionNotice::QuestionAccepted { question } => vec![
            turn_line(&Turn::user(question)),
            format!("[{}]", session.status().label()),
        ],
        SessionNotice::QuestionIgnored => {
            vec!["(no active document, empty question, or an answer is pending)".into()]
        }
        SessionNotice::AnswerApplied { completion } => {
            let mut lines: Vec<String> =
                session.transcript().last().map(turn_line).into_iter().collect();
            if completion == Completion::Failed {
                lines.push("(type :retry to ask again)".into());
            }
            lines
        }
        SessionNotice::StaleDropped => {
            log::debug!("stale answer dropped");
            Vec::new()
        }
        SessionNotice::UploadStarted { label } => vec![format!("Uploading {label}...")],
        SessionNotice::UploadIgnored => vec!["(an upload is already running)".into()],
        SessionNotice::UploadFailed { message } => vec![format!("Upload failed: {message}")],
        SessionNotice::DocumentChanged { label, message } => {
            vec![message, format!("Active document: {label}")]
        }
        SessionNotice::Exported { path } => vec![format!("Exported to {}", path.display())],
        SessionNotice::ExportFailed { message } => vec![format!("Export failed: {message}")],
    }
}

async fn print_notices(session: SharedSession, mut notices: mpsc::Receiver<SessionNotice>) {
    while let Some(notice) = notices.recv().await {
        let lines = {
            let session = session.lock().unwrap_or_else(PoisonError::into_inner);
            notice_lines(notice, &session)
        };
        for line in lines {
            println!("{line}");
        }
    }
}

fn print_sources(session: &SharedSession) {
    let session = session.lock().unwrap_or_else(PoisonError::into_inner);
    let sources = session.last_sources();
    if sources.is_empty() {
        println!("(no sources)");
        return;
    }
    for (i, source) in sources.iter().enumerate() {
        println!("[{}] {source}", i + 1);
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("RAG Notebook starting up");

    // 2. Configuration
    let config = AppConfig::load_or_create().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    log::info!("Backend: {}", config.service.base_url);

    // 3. Tokio runtime
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;

    rt.block_on(run_console(config))
}

async fn run_console(config: AppConfig) -> anyhow::Result<()> {
    // 4. Services
    let answer = Arc::new(HttpAnswerService::from_config(&config.service));
    let upload = Arc::new(HttpUploadService::from_config(&config.service));

    // 5. Session
    let session = new_shared_session(SessionController::new(config.session.clone(), answer));

    // 6. Runner + notice printer
    let (event_tx, event_rx) = mpsc::channel::<SessionEvent>(16);
    let (notice_tx, notice_rx) = mpsc::channel::<SessionNotice>(32);

    let runner = SessionRunner::new(Arc::clone(&session), upload, config.export.clone(), notice_tx);
    let runner_handle = tokio::spawn(runner.run(event_rx));
    let printer_handle = tokio::spawn(print_notices(Arc::clone(&session), notice_rx));

    // 7. Command loop
    println!("Upload a document with :upload <path>, then ask questions. :quit exits.");
    let export_dir = config.export_dir();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        match parse_command(&line, &export_dir) {
            Command::Nothing => {}
            Command::Quit => break,
            Command::Sources => print_sources(&session),
            Command::Event(event) => {
                if event_tx.send(event).await.is_err() {
                    log::error!("session runner stopped");
                    break;
                }
            }
        }
    }

    // Closing the event channel lets the runner drain in-flight calls.
    drop(event_tx);
    runner_handle.await?;
    printer_handle.await?;
    log::info!("RAG Notebook shutting down");
    Ok(())
}
