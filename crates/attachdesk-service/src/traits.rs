use async_trait::async_trait;
use attachdesk_core::attachment::{AttachmentInput, TrackedAttachment};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("remote error: {0}")]
    Remote(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("decode error: {0}")]
    Decode(String),
}

impl ServiceError {
    /// The human-readable message without the kind prefix, as shown to the operator.
    pub fn message(&self) -> &str {
        match self {
            ServiceError::NotFound(msg)
            | ServiceError::Validation(msg)
            | ServiceError::Conflict(msg)
            | ServiceError::Remote(msg)
            | ServiceError::Network(msg)
            | ServiceError::Decode(msg) => msg,
        }
    }
}

/// The remote tracked-attachment API.
///
/// The console programs against this trait.
/// `HttpService` talks to the administrative server over HTTP;
/// `MemoryService` (test-helpers feature) keeps everything in process.
#[async_trait]
pub trait AttachmentService: Send + Sync {
    async fn list_attachments(&self) -> Result<Vec<TrackedAttachment>, ServiceError>;
    async fn get_attachment(&self, id: i64) -> Result<TrackedAttachment, ServiceError>;
    async fn create_attachment(
        &self,
        input: &AttachmentInput,
    ) -> Result<TrackedAttachment, ServiceError>;
    async fn update_attachment(
        &self,
        id: i64,
        input: &AttachmentInput,
    ) -> Result<TrackedAttachment, ServiceError>;
    async fn delete_attachment(&self, id: i64) -> Result<(), ServiceError>;
}
