use std::sync::Arc;

use attachdesk_core::attachment::{AttachmentInput, TrackedAttachment};
use attachdesk_service::{AttachmentService, ServiceError};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::surface::{AttachmentRow, RowOrder};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl StoreError {
    pub fn message(&self) -> &str {
        match self {
            StoreError::Service(e) => e.message(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    NotLoaded,
    Ready,
    Failed(String),
}

/// Client-side snapshot of every tracked attachment plus the remote calls
/// that change them.
///
/// The snapshot is only ever replaced wholesale by `reload`; mutations mark
/// it stale and leave it untouched.
pub struct AttachmentStore {
    service: Arc<dyn AttachmentService>,
    snapshot: Vec<TrackedAttachment>,
    status: LoadStatus,
    stale: bool,
}

impl AttachmentStore {
    pub fn new(service: Arc<dyn AttachmentService>) -> Self {
        Self {
            service,
            snapshot: Vec::new(),
            status: LoadStatus::NotLoaded,
            stale: true,
        }
    }

    /// Fetch the full list and replace the snapshot. On failure the old
    /// snapshot is dropped.
    pub async fn reload(&mut self) -> Result<&[TrackedAttachment], StoreError> {
        match self.service.list_attachments().await {
            Ok(list) => {
                debug!(count = list.len(), "attachment snapshot reloaded");
                self.snapshot = list;
                self.status = LoadStatus::Ready;
                self.stale = false;
                Ok(&self.snapshot)
            }
            Err(e) => {
                warn!(error = %e, "attachment reload failed");
                self.snapshot.clear();
                self.status = LoadStatus::Failed(e.message().to_string());
                Err(e.into())
            }
        }
    }

    pub async fn create(&mut self, input: &AttachmentInput) -> Result<TrackedAttachment, StoreError> {
        let created = self.service.create_attachment(input).await?;
        info!(id = ?created.id, name = %created.name, "attachment created");
        self.stale = true;
        Ok(created)
    }

    pub async fn update(
        &mut self,
        id: i64,
        input: &AttachmentInput,
    ) -> Result<TrackedAttachment, StoreError> {
        let updated = self.service.update_attachment(id, input).await?;
        info!(id, name = %updated.name, "attachment updated");
        self.stale = true;
        Ok(updated)
    }

    pub async fn delete(&mut self, id: i64) -> Result<(), StoreError> {
        self.service.delete_attachment(id).await?;
        info!(id, "attachment deleted");
        self.stale = true;
        Ok(())
    }

    pub fn items(&self) -> &[TrackedAttachment] {
        &self.snapshot
    }

    pub fn get(&self, index: usize) -> Option<&TrackedAttachment> {
        self.snapshot.get(index)
    }

    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    /// True until a reload succeeds after construction or any mutation.
    pub fn needs_reload(&self) -> bool {
        self.stale
    }

    pub fn rows(&self, order: RowOrder) -> Vec<AttachmentRow> {
        let mut rows: Vec<_> = self
            .snapshot
            .iter()
            .enumerate()
            .map(|(i, a)| AttachmentRow::new(i, a))
            .collect();
        order.apply(&mut rows);
        rows
    }
}
