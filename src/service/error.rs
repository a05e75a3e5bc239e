//! Error type shared by both service clients.

use thiserror::Error;

/// Errors that can occur while talking to the Upload or Answer service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// HTTP transport or connection error.
    #[error("Network error: {0}")]
    Request(String),

    /// The call did not complete within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// The service answered with a non-success status code.
    #[error("Request failed with status code {status}")]
    Status {
        status: u16,
        /// Human-readable `detail` field of the error body, when present.
        detail: Option<String>,
    },

    /// The response body did not have the expected shape.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The document to upload could not be read.
    #[error("Cannot read document: {0}")]
    Io(String),
}

impl ServiceError {
    /// Best-effort message for the user: the service's own `detail` verbatim
    /// when it sent one, otherwise a generic description of the failure.
    ///
    /// ```
    /// use rag_notebook::service::ServiceError;
    ///
    /// let err = ServiceError::Status { status: 404, detail: Some("document not found".into()) };
    /// assert_eq!(err.detail(), "document not found");
    /// assert_eq!(ServiceError::Timeout.detail(), "Request timed out");
    /// ```
    pub fn detail(&self) -> String {
        match self {
            ServiceError::Status {
                detail: Some(detail),
                ..
            } if !detail.trim().is_empty() => detail.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ServiceError::Timeout
        } else if e.is_decode() {
            ServiceError::Malformed(e.to_string())
        } else {
            ServiceError::Request(e.to_string())
        }
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(e: std::io::Error) -> Self {
        ServiceError::Io(e.to_string())
    }
}
