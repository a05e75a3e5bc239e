//! `reqwest` clients for the RAG backend.
//!
//! * [`HttpUploadService`]: `POST {base_url}/process-docs`, multipart field
//!   `file`, answers `{"message": …, "document_name": …}`.
//! * [`HttpAnswerService`]: `POST {base_url}/ask-doc` with
//!   `{"document_name": …, "question": …}`, answers
//!   `{"answer": …, "sources": […]}`.
//!
//! Non-2xx responses are turned into [`ServiceError::Status`] carrying the
//! body's `detail` field when the backend sent one.  All connection details
//! come from [`ServiceConfig`]; nothing is hardcoded.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::ServiceConfig;
use crate::transcript::{Speaker, Turn};

use super::{Answer, AnswerService, Question, ServiceError, UploadReceipt, UploadService};

fn build_client(config: &ServiceConfig) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(config.timeout())
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Pass successful responses through; convert anything else into
/// [`ServiceError::Status`].
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ServiceError::Status {
        status: status.as_u16(),
        detail: extract_detail(&body),
    })
}

/// Pull a human-readable `detail` out of an error body.
///
/// FastAPI sends either a plain string or a list of validation records; the
/// latter is passed through as compact JSON.
fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn history_entry(turn: &Turn) -> Value {
    let kind = match turn.speaker {
        Speaker::User => "human",
        Speaker::Assistant => "ai",
    };
    json!({ "type": kind, "content": turn.content })
}

// ---------------------------------------------------------------------------
// HttpAnswerService
// ---------------------------------------------------------------------------

pub struct HttpAnswerService {
    client: reqwest::Client,
    url: String,
}

impl HttpAnswerService {
    /// Build a client from service config.  The per-request timeout comes
    /// from `config.timeout_secs`.
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            client: build_client(config),
            url: config.ask_url(),
        }
    }
}

#[async_trait]
impl AnswerService for HttpAnswerService {
    async fn ask(&self, question: &Question) -> Result<Answer, ServiceError> {
        let mut body = json!({
            "document_name": question.document_id,
            "question":      question.question,
        });
        if !question.history.is_empty() {
            body["chat_history"] = question.history.iter().map(history_entry).collect();
        }

        log::debug!("answer service: POST {}", self.url);
        let response = self.client.post(&self.url).json(&body).send().await?;
        let response = check_status(response).await?;

        response
            .json::<Answer>()
            .await
            .map_err(|e| ServiceError::Malformed(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// HttpUploadService
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct UploadPayload {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    document_name: Option<String>,
}

pub struct HttpUploadService {
    client: reqwest::Client,
    url: String,
}

impl HttpUploadService {
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            client: build_client(config),
            url: config.upload_url(),
        }
    }
}

#[async_trait]
impl UploadService for HttpUploadService {
    async fn upload(&self, path: &Path) -> Result<UploadReceipt, ServiceError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".into());

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new().part("file", part);

        log::debug!("upload service: POST {}", self.url);
        let response = self.client.post(&self.url).multipart(form).send().await?;
        let response = check_status(response).await?;

        let payload: UploadPayload = response
            .json()
            .await
            .map_err(|e| ServiceError::Malformed(e.to_string()))?;

        let document_id = payload
            .document_name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| ServiceError::Malformed("missing document_name".into()))?;

        Ok(UploadReceipt {
            document_id,
            message: payload.message.unwrap_or_default(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
