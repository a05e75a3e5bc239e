//! Upload Service contract.

use std::path::Path;

use async_trait::async_trait;

use super::ServiceError;

/// What a successful upload hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Identifier to quote in every later question.
    pub document_id: String,
    /// Human-readable status line from the service.
    pub message: String,
}

/// Async trait for anything that can ingest a local document.
#[async_trait]
pub trait UploadService: Send + Sync {
    async fn upload(&self, path: &Path) -> Result<UploadReceipt, ServiceError>;
}
