use std::sync::Mutex;

use async_trait::async_trait;
use attachdesk_core::attachment::{AttachmentInput, TrackedAttachment};
use attachdesk_core::data_uri;
use chrono::Utc;

use crate::{AttachmentService, ServiceError};

/// A call observed by `MemoryService`, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    List,
    Get(i64),
    Create(AttachmentInput),
    Update(i64, AttachmentInput),
    Delete(i64),
}

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    items: Vec<TrackedAttachment>,
    calls: Vec<RecordedCall>,
    fail_next: Option<ServiceError>,
}

/// In-process stand-in for the remote attachment API.
///
/// Applies the same field validation and name-uniqueness rules as the
/// administrative server so client flows can be exercised without one.
#[derive(Default)]
pub struct MemoryService {
    state: Mutex<MemoryState>,
}

impl MemoryService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with pre-existing attachments; ids are assigned in order.
    pub fn with_attachments(inputs: Vec<AttachmentInput>) -> Self {
        let svc = Self::new();
        {
            let mut state = svc.lock();
            for input in inputs {
                state.next_id += 1;
                let mut att = TrackedAttachment::from_input(state.next_id, &input);
                att.modified_date = Some(Utc::now());
                state.items.push(att);
            }
        }
        svc
    }

    /// Make the next call fail with `err` regardless of its arguments.
    pub fn fail_next(&self, err: ServiceError) {
        self.lock().fail_next = Some(err);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn begin(&self, call: RecordedCall) -> Result<std::sync::MutexGuard<'_, MemoryState>, ServiceError> {
        let mut state = self.lock();
        state.calls.push(call);
        match state.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(state),
        }
    }
}

fn validate(input: &AttachmentInput) -> Result<(), ServiceError> {
    if input.name.is_empty() {
        return Err(ServiceError::Validation(
            "Tracked Attachment name not specified".into(),
        ));
    }
    if input.content.is_empty() {
        return Err(ServiceError::Validation(
            "Tracked Attachment content not specified".into(),
        ));
    }
    if input.mime_type.is_empty() {
        return Err(ServiceError::Validation(
            "Tracked Attachment type not specified".into(),
        ));
    }
    if input.filename.is_empty() {
        return Err(ServiceError::Validation(
            "Tracked Attachment filename not specified".into(),
        ));
    }
    data_uri::decode_payload(&input.content)
        .map_err(|_| ServiceError::Validation("Invalid request".into()))?;
    Ok(())
}

#[async_trait]
impl AttachmentService for MemoryService {
    async fn list_attachments(&self) -> Result<Vec<TrackedAttachment>, ServiceError> {
        let state = self.begin(RecordedCall::List)?;
        Ok(state.items.clone())
    }

    async fn get_attachment(&self, id: i64) -> Result<TrackedAttachment, ServiceError> {
        let state = self.begin(RecordedCall::Get(id))?;
        state
            .items
            .iter()
            .find(|a| a.id == Some(id))
            .cloned()
            .ok_or_else(|| ServiceError::NotFound("Tracked Attachment not found".into()))
    }

    async fn create_attachment(
        &self,
        input: &AttachmentInput,
    ) -> Result<TrackedAttachment, ServiceError> {
        let mut state = self.begin(RecordedCall::Create(input.clone()))?;
        if state.items.iter().any(|a| a.name == input.name) {
            return Err(ServiceError::Conflict(
                "Tracked Attachment name already in use".into(),
            ));
        }
        validate(input)?;
        state.next_id += 1;
        let mut att = TrackedAttachment::from_input(state.next_id, input);
        att.modified_date = Some(Utc::now());
        state.items.push(att.clone());
        Ok(att)
    }

    async fn update_attachment(
        &self,
        id: i64,
        input: &AttachmentInput,
    ) -> Result<TrackedAttachment, ServiceError> {
        let mut state = self.begin(RecordedCall::Update(id, input.clone()))?;
        let pos = state
            .items
            .iter()
            .position(|a| a.id == Some(id))
            .ok_or_else(|| ServiceError::NotFound("Tracked Attachment not found".into()))?;
        validate(input).map_err(|e| {
            ServiceError::Validation(format!("Error updating Tracked Attachment: {}", e.message()))
        })?;
        let mut att = TrackedAttachment::from_input(id, input);
        att.modified_date = Some(Utc::now());
        state.items[pos] = att.clone();
        Ok(att)
    }

    async fn delete_attachment(&self, id: i64) -> Result<(), ServiceError> {
        let mut state = self.begin(RecordedCall::Delete(id))?;
        let before = state.items.len();
        state.items.retain(|a| a.id != Some(id));
        if state.items.len() == before {
            return Err(ServiceError::NotFound("Tracked Attachment not found".into()));
        }
        Ok(())
    }
}
