//! End-to-end session flow against a mocked RAG backend.
//!
//! Upload → ask → answer → history replay → export, all through the real
//! HTTP services and the session runner.

use std::sync::Arc;

use rag_notebook::config::{AppConfig, ServiceConfig, SessionConfig};
use rag_notebook::service::{HttpAnswerService, HttpUploadService};
use rag_notebook::session::{
    new_shared_session, Completion, SessionController, SessionEvent, SessionNotice, SessionRunner,
    SessionStatus,
};
use serde_json::json;
use tempfile::TempDir;
use tokio::sync::mpsc;
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn service_config(server: &MockServer) -> ServiceConfig {
    ServiceConfig {
        base_url: server.uri(),
        timeout_secs: 5,
        ..ServiceConfig::default()
    }
}

async fn wait_for(
    notices: &mut mpsc::Receiver<SessionNotice>,
    wanted: impl Fn(&SessionNotice) -> bool,
) -> SessionNotice {
    loop {
        let notice = notices.recv().await.expect("notice channel closed");
        if wanted(&notice) {
            return notice;
        }
    }
}

#[tokio::test]
async fn upload_ask_and_export_against_backend() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/process-docs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Received 1 files for processing.",
            "document_name": "report.pdf"
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Second question carries the first exchange as history.
    Mock::given(method("POST"))
        .and(path("/ask-doc"))
        .and(body_partial_json(json!({
            "question": "And Z?",
            "chat_history": [
                { "type": "human", "content": "What is X?" },
                { "type": "ai", "content": "X is Y." }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer": "Z follows from Y.",
            "sources": ["page 3"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/ask-doc"))
        .and(body_json(json!({
            "document_name": "report.pdf",
            "question": "What is X?"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer": "X is Y.",
            "sources": ["page 1", "page 2"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let document = temp_dir.path().join("report.pdf");
    std::fs::write(&document, b"%PDF-1.4 fake").unwrap();

    let config = AppConfig {
        service: service_config(&server),
        session: SessionConfig {
            send_history: true,
            ..SessionConfig::default()
        },
        ..AppConfig::default()
    };

    let session = new_shared_session(SessionController::new(
        config.session.clone(),
        Arc::new(HttpAnswerService::from_config(&config.service)),
    ));
    let (event_tx, event_rx) = mpsc::channel(16);
    let (notice_tx, mut notices) = mpsc::channel(64);
    let runner = SessionRunner::new(
        Arc::clone(&session),
        Arc::new(HttpUploadService::from_config(&config.service)),
        config.export.clone(),
        notice_tx,
    );
    let handle = tokio::spawn(runner.run(event_rx));

    event_tx.send(SessionEvent::Upload(document)).await.unwrap();
    let notice = wait_for(&mut notices, |n| {
        matches!(n, SessionNotice::DocumentChanged { .. })
    })
    .await;
    assert_eq!(
        notice,
        SessionNotice::DocumentChanged {
            label: "report.pdf".into(),
            message: "Received 1 files for processing.".into()
        }
    );

    event_tx.send(SessionEvent::Ask("What is X?".into())).await.unwrap();
    let notice = wait_for(&mut notices, |n| {
        matches!(n, SessionNotice::AnswerApplied { .. })
    })
    .await;
    assert_eq!(
        notice,
        SessionNotice::AnswerApplied {
            completion: Completion::Answered
        }
    );
    assert_eq!(
        session.lock().unwrap().last_sources(),
        ["page 1", "page 2"]
    );

    event_tx.send(SessionEvent::Ask("And Z?".into())).await.unwrap();
    wait_for(&mut notices, |n| {
        matches!(n, SessionNotice::AnswerApplied { .. })
    })
    .await;

    let exports = temp_dir.path().join("exports");
    event_tx
        .send(SessionEvent::Export {
            dir: exports.clone(),
        })
        .await
        .unwrap();
    let notice = wait_for(&mut notices, |n| {
        matches!(
            n,
            SessionNotice::Exported { .. } | SessionNotice::ExportFailed { .. }
        )
    })
    .await;
    assert_eq!(
        notice,
        SessionNotice::Exported {
            path: exports.join("report_chat.pdf")
        }
    );

    drop(event_tx);
    handle.await.unwrap();

    let session = session.lock().unwrap();
    assert_eq!(session.status(), SessionStatus::Idle);
    let contents: Vec<String> = session
        .transcript()
        .into_iter()
        .map(|t| t.content)
        .collect();
    assert_eq!(
        contents,
        ["What is X?", "X is Y.", "And Z?", "Z follows from Y."]
    );
    assert_eq!(session.last_sources(), ["page 3"]);

    let pdf = std::fs::read(exports.join("report_chat.pdf")).unwrap();
    assert!(pdf.starts_with(b"%PDF-1.4"));
    let text = String::from_utf8_lossy(&pdf);
    assert!(text.contains("(Chat transcript: report.pdf) Tj"));
    assert!(text.contains("(Z follows from Y.) Tj"));
}

#[tokio::test]
async fn backend_error_becomes_error_turn_and_retry_recovers() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ask-doc"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "detail": "vector store offline" })),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ask-doc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "answer": "Recovered." })))
        .mount(&server)
        .await;

    let config = service_config(&server);
    let session = new_shared_session(SessionController::new(
        SessionConfig::default(),
        Arc::new(HttpAnswerService::from_config(&config)),
    ));
    let (event_tx, event_rx) = mpsc::channel(16);
    let (notice_tx, mut notices) = mpsc::channel(64);
    let runner = SessionRunner::new(
        Arc::clone(&session),
        Arc::new(HttpUploadService::from_config(&config)),
        AppConfig::default().export,
        notice_tx,
    );
    let handle = tokio::spawn(runner.run(event_rx));

    event_tx
        .send(SessionEvent::DocumentChanged(
            rag_notebook::session::Document::new("report.pdf", "report.pdf"),
        ))
        .await
        .unwrap();
    event_tx.send(SessionEvent::Ask("What is X?".into())).await.unwrap();
    let notice = wait_for(&mut notices, |n| {
        matches!(n, SessionNotice::AnswerApplied { .. })
    })
    .await;
    assert_eq!(
        notice,
        SessionNotice::AnswerApplied {
            completion: Completion::Failed
        }
    );
    {
        let turns = session.lock().unwrap().transcript();
        assert!(turns[1].is_error);
        assert_eq!(
            turns[1].content,
            "Error: Failed to get an answer. vector store offline"
        );
    }

    event_tx.send(SessionEvent::Retry).await.unwrap();
    let notice = wait_for(&mut notices, |n| {
        matches!(n, SessionNotice::AnswerApplied { .. })
    })
    .await;
    assert_eq!(
        notice,
        SessionNotice::AnswerApplied {
            completion: Completion::Answered
        }
    );

    drop(event_tx);
    handle.await.unwrap();

    let turns = session.lock().unwrap().transcript();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].content, "What is X?");
    assert_eq!(turns[1].content, "Recovered.");
    assert!(!turns[1].is_error);
}
