//! The create/edit/copy dialog and the delete confirmation flow.

use attachdesk_core::attachment::{AttachmentInput, TrackedAttachment};
use attachdesk_core::{data_uri, icon};
use thiserror::Error;
use tracing::{debug, warn};

use crate::encoder::{EncodeError, FileEncoder, SelectedFile};
use crate::store::{AttachmentStore, StoreError};
use crate::surface::{ConfirmDecision, ConfirmPrompt, ConfirmSurface, Notifier};

pub const ADDED_MESSAGE: &str = "Tracked Attachment added successfully!";
pub const EDITED_MESSAGE: &str = "Tracked Attachment edited successfully!";
pub const DELETED_MESSAGE: &str = "Tracked Attachment Deleted!";
pub const FETCH_FAILED_MESSAGE: &str = "Error fetching tracked attachments";

const COPY_PREFIX: &str = "Copy of ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit(usize),
    Copy(usize),
}

impl EditorMode {
    pub fn title(&self) -> &'static str {
        match self {
            EditorMode::Create => "New Tracked Attachment",
            EditorMode::Edit(_) => "Edit Tracked Attachment",
            EditorMode::Copy(_) => "Copy Tracked Attachment",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Closed,
    Opening(EditorMode),
    Populated,
    Submitting,
}

/// File fields always travel together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftFile {
    pub filename: String,
    pub mime_type: String,
    /// Base64 payload.
    pub content: String,
}

/// Unsaved working copy shown in the dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub name: String,
    pub file: Option<DraftFile>,
}

impl Draft {
    fn seeded(name: String, source: &TrackedAttachment) -> Self {
        Self {
            name,
            file: Some(DraftFile {
                filename: source.filename.clone(),
                mime_type: source.mime_type.clone(),
                content: source.content.clone(),
            }),
        }
    }

    /// Request body. Missing file fields go out empty and are left for the
    /// server to reject.
    pub fn to_input(&self) -> AttachmentInput {
        let file = self.file.clone().unwrap_or_default();
        AttachmentInput {
            name: self.name.clone(),
            filename: file.filename,
            mime_type: file.mime_type,
            content: file.content,
        }
    }
}

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("editor is not open")]
    NotOpen,
    #[error("no attachment at index {0}")]
    NotFound(usize),
    #[error("a submission is already in flight")]
    Busy,
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Saved(TrackedAttachment),
    /// The server refused; its message is now the dialog error.
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Cancelled,
}

/// A delete waiting on the operator.
#[derive(Debug, Clone)]
pub struct PendingDelete {
    id: i64,
    prompt: ConfirmPrompt,
}

impl PendingDelete {
    fn new(attachment: &TrackedAttachment, id: i64) -> Self {
        Self {
            id,
            prompt: ConfirmPrompt {
                title: "Are you sure?".into(),
                body: "This will delete the Tracked Attachment. This can't be undone!".into(),
                confirm_label: format!("Delete {}", attachment.name),
                error: None,
            },
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn prompt(&self) -> &ConfirmPrompt {
        &self.prompt
    }

    /// Why the last confirmed attempt was rejected.
    pub fn error(&self) -> Option<&str> {
        self.prompt.error.as_deref()
    }

    /// Run the remote delete. On failure the prompt keeps the reason and
    /// may be confirmed again.
    pub async fn confirm(
        &mut self,
        store: &mut AttachmentStore,
        notifier: &dyn Notifier,
    ) -> Result<(), StoreError> {
        match store.delete(self.id).await {
            Ok(()) => {
                self.prompt.error = None;
                notifier.success(DELETED_MESSAGE);
                refresh(store, notifier).await;
                Ok(())
            }
            Err(e) => {
                warn!(id = self.id, error = %e, "delete rejected");
                self.prompt.error = Some(e.message().to_string());
                Err(e)
            }
        }
    }

    pub fn cancel(self) {
        debug!(id = self.id, "delete cancelled");
    }
}

async fn refresh(store: &mut AttachmentStore, notifier: &dyn Notifier) {
    if store.reload().await.is_err() {
        notifier.error(FETCH_FAILED_MESSAGE);
    }
}

/// One dialog instance reused for every mode.
#[derive(Debug)]
pub struct AttachmentEditor {
    state: EditorState,
    mode: Option<EditorMode>,
    /// Id captured from the snapshot when an edit opens.
    target_id: Option<i64>,
    draft: Draft,
    error: Option<String>,
}

impl Default for AttachmentEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl AttachmentEditor {
    pub fn new() -> Self {
        Self {
            state: EditorState::Closed,
            mode: None,
            target_id: None,
            draft: Draft::default(),
            error: None,
        }
    }

    pub fn open(&mut self, mode: EditorMode, store: &AttachmentStore) -> Result<(), EditorError> {
        let (draft, target_id) = match mode {
            EditorMode::Create => (Draft::default(), None),
            EditorMode::Edit(index) => {
                let source = store.get(index).ok_or(EditorError::NotFound(index))?;
                let id = source.id.ok_or(EditorError::NotFound(index))?;
                (Draft::seeded(source.name.clone(), source), Some(id))
            }
            EditorMode::Copy(index) => {
                let source = store.get(index).ok_or(EditorError::NotFound(index))?;
                let name = format!("{COPY_PREFIX}{}", source.name);
                (Draft::seeded(name, source), None)
            }
        };
        self.state = EditorState::Opening(mode);
        self.mode = Some(mode);
        self.target_id = target_id;
        self.draft = draft;
        self.error = None;
        self.state = EditorState::Populated;
        debug!(?mode, "editor opened");
        Ok(())
    }

    /// Encode `file` into the draft. A failed read leaves the draft as it was.
    pub async fn attach(
        &mut self,
        file: &SelectedFile,
        encoder: &FileEncoder,
    ) -> Result<(), EditorError> {
        if !self.is_open() {
            return Err(EditorError::NotOpen);
        }
        let encoded = encoder.encode(file).await?;
        self.draft.file = Some(DraftFile {
            filename: encoded.filename,
            mime_type: encoded.mime_type,
            content: encoded.base64,
        });
        Ok(())
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.draft.name = name.into();
    }

    pub fn push_char(&mut self, c: char) {
        self.draft.name.push(c);
    }

    pub fn pop_char(&mut self) {
        self.draft.name.pop();
    }

    pub async fn submit(
        &mut self,
        store: &mut AttachmentStore,
        notifier: &dyn Notifier,
    ) -> Result<SubmitOutcome, EditorError> {
        let mode = match (self.state, self.mode) {
            (EditorState::Submitting, _) => return Err(EditorError::Busy),
            (EditorState::Populated, Some(mode)) => mode,
            _ => return Err(EditorError::NotOpen),
        };
        self.state = EditorState::Submitting;
        let input = self.draft.to_input();

        let result = match (mode, self.target_id) {
            (EditorMode::Edit(_), Some(id)) => store
                .update(id, &input)
                .await
                .map(|saved| (saved, EDITED_MESSAGE)),
            _ => store
                .create(&input)
                .await
                .map(|saved| (saved, ADDED_MESSAGE)),
        };

        match result {
            Ok((saved, message)) => {
                notifier.success(message);
                refresh(store, notifier).await;
                self.close();
                Ok(SubmitOutcome::Saved(saved))
            }
            Err(e) => {
                let message = e.message().to_string();
                debug!(error = %message, "submit rejected");
                self.error = Some(message.clone());
                self.state = EditorState::Populated;
                Ok(SubmitOutcome::Rejected(message))
            }
        }
    }

    /// Dismiss the dialog and forget the draft.
    pub fn close(&mut self) {
        self.state = EditorState::Closed;
        self.mode = None;
        self.target_id = None;
        self.draft = Draft::default();
        self.error = None;
    }

    pub fn request_delete(
        &self,
        index: usize,
        store: &AttachmentStore,
    ) -> Result<PendingDelete, EditorError> {
        let attachment = store.get(index).ok_or(EditorError::NotFound(index))?;
        let id = attachment.id.ok_or(EditorError::NotFound(index))?;
        Ok(PendingDelete::new(attachment, id))
    }

    /// Ask through `surface` and delete on confirmation. A rejected delete
    /// asks again with the reason shown until it succeeds or is cancelled.
    pub async fn delete(
        &self,
        index: usize,
        store: &mut AttachmentStore,
        surface: &dyn ConfirmSurface,
        notifier: &dyn Notifier,
    ) -> Result<DeleteOutcome, EditorError> {
        let mut pending = self.request_delete(index, store)?;
        loop {
            match surface.confirm(pending.prompt()).await {
                ConfirmDecision::Cancel => {
                    pending.cancel();
                    return Ok(DeleteOutcome::Cancelled);
                }
                ConfirmDecision::Confirm => {
                    if pending.confirm(store, notifier).await.is_ok() {
                        return Ok(DeleteOutcome::Deleted);
                    }
                }
            }
        }
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn mode(&self) -> Option<EditorMode> {
        self.mode
    }

    pub fn target_id(&self) -> Option<i64> {
        self.target_id
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.state, EditorState::Closed)
    }

    pub fn preview_icon(&self) -> &'static str {
        self.draft
            .file
            .as_ref()
            .map(|f| icon::for_mime(&f.mime_type))
            .unwrap_or(icon::DEFAULT_ICON)
    }

    pub fn preview_uri(&self) -> Option<String> {
        self.draft
            .file
            .as_ref()
            .map(|f| data_uri::compose(&f.mime_type, &f.content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::NoticeBoard;
    use attachdesk_service::{MemoryService, RecordedCall, ServiceError};
    use std::sync::Arc;

    fn input(name: &str, mime: &str) -> AttachmentInput {
        AttachmentInput {
            name: name.into(),
            filename: format!("{name}.bin"),
            mime_type: mime.into(),
            content: "AAEC".into(),
        }
    }

    async fn loaded(inputs: Vec<AttachmentInput>) -> (Arc<MemoryService>, AttachmentStore) {
        let svc = Arc::new(MemoryService::with_attachments(inputs));
        let mut store = AttachmentStore::new(svc.clone());
        store.reload().await.unwrap();
        (svc, store)
    }

    #[tokio::test]
    async fn create_always_starts_empty() {
        let (_svc, store) = loaded(vec![input("Logo", "image/png")]).await;
        let mut editor = AttachmentEditor::new();
        editor.open(EditorMode::Edit(0), &store).unwrap();
        assert_eq!(editor.draft().name, "Logo");

        editor.open(EditorMode::Create, &store).unwrap();
        assert_eq!(editor.draft(), &Draft::default());
        assert_eq!(editor.target_id(), None);
        assert_eq!(editor.state(), EditorState::Populated);
        assert_eq!(editor.preview_icon(), "fa-file-o");
        assert!(editor.preview_uri().is_none());
    }

    #[tokio::test]
    async fn edit_seeds_fields_and_target() {
        let (_svc, store) = loaded(vec![input("Logo", "image/png")]).await;
        let mut editor = AttachmentEditor::new();
        editor.open(EditorMode::Edit(0), &store).unwrap();

        let file = editor.draft().file.clone().unwrap();
        assert_eq!(file.filename, "Logo.bin");
        assert_eq!(file.mime_type, "image/png");
        assert_eq!(editor.target_id(), store.get(0).unwrap().id);
        assert_eq!(editor.preview_icon(), "fa-file-image-o");
        assert_eq!(
            editor.preview_uri().as_deref(),
            Some("data:image/png;base64,AAEC")
        );
    }

    #[tokio::test]
    async fn copy_prefixes_name_and_drops_id() {
        let (_svc, store) = loaded(vec![input("Logo", "image/png")]).await;
        let mut editor = AttachmentEditor::new();
        editor.open(EditorMode::Copy(0), &store).unwrap();

        assert_eq!(editor.draft().name, "Copy of Logo");
        assert_eq!(editor.target_id(), None);
        let mut expected = input("Logo", "image/png");
        expected.name = "Copy of Logo".into();
        assert_eq!(editor.draft().to_input(), expected);
    }

    #[tokio::test]
    async fn stale_index_is_not_found() {
        let (_svc, store) = loaded(vec![]).await;
        let mut editor = AttachmentEditor::new();
        let err = editor.open(EditorMode::Edit(3), &store).unwrap_err();
        assert!(matches!(err, EditorError::NotFound(3)));
        assert!(!editor.is_open());
    }

    #[tokio::test]
    async fn copy_submit_creates_new_entity() {
        let (svc, mut store) = loaded(vec![input("Logo", "image/png")]).await;
        let source_id = store.get(0).unwrap().id;
        let notices = NoticeBoard::new();
        let mut editor = AttachmentEditor::new();
        editor.open(EditorMode::Copy(0), &store).unwrap();

        let outcome = editor.submit(&mut store, &notices).await.unwrap();
        let SubmitOutcome::Saved(saved) = outcome else {
            panic!("copy was rejected");
        };
        assert_ne!(saved.id, source_id);
        assert_eq!(store.len(), 2);
        assert_eq!(svc.len(), 2);
        assert_eq!(notices.latest().unwrap().message, ADDED_MESSAGE);
    }

    #[tokio::test]
    async fn edit_submit_updates_in_place() {
        let (svc, mut store) = loaded(vec![input("Logo", "image/png")]).await;
        let id = store.get(0).unwrap().id.unwrap();
        let notices = NoticeBoard::new();
        let mut editor = AttachmentEditor::new();
        editor.open(EditorMode::Edit(0), &store).unwrap();
        editor.set_name("Brand");

        let outcome = editor.submit(&mut store, &notices).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Saved(_)));
        assert!(!editor.is_open());
        assert_eq!(store.get(0).unwrap().name, "Brand");
        assert_eq!(notices.latest().unwrap().message, EDITED_MESSAGE);
        assert!(svc
            .calls()
            .iter()
            .any(|c| matches!(c, RecordedCall::Update(got, _) if *got == id)));
    }

    #[tokio::test]
    async fn rejected_submit_keeps_dialog_and_fields() {
        let (_svc, mut store) = loaded(vec![]).await;
        let notices = NoticeBoard::new();
        let mut editor = AttachmentEditor::new();
        editor.open(EditorMode::Create, &store).unwrap();
        for c in "Memo".chars() {
            editor.push_char(c);
        }
        editor.pop_char();

        let outcome = editor.submit(&mut store, &notices).await.unwrap();
        let message = "Tracked Attachment content not specified";
        assert_eq!(outcome, SubmitOutcome::Rejected(message.into()));
        assert_eq!(editor.error(), Some(message));
        assert_eq!(editor.state(), EditorState::Populated);
        assert_eq!(editor.draft().name, "Mem");
        assert!(notices.all().is_empty());
    }

    #[tokio::test]
    async fn close_clears_error_and_fields() {
        let (_svc, mut store) = loaded(vec![]).await;
        let notices = NoticeBoard::new();
        let mut editor = AttachmentEditor::new();
        editor.open(EditorMode::Create, &store).unwrap();
        editor.submit(&mut store, &notices).await.unwrap();
        assert!(editor.error().is_some());

        editor.close();
        assert_eq!(editor.state(), EditorState::Closed);
        assert!(editor.error().is_none());
        assert_eq!(editor.draft(), &Draft::default());
        assert!(editor.mode().is_none());
    }

    #[tokio::test]
    async fn submit_requires_open_dialog() {
        let (_svc, mut store) = loaded(vec![]).await;
        let mut editor = AttachmentEditor::new();
        let err = editor.submit(&mut store, &NoticeBoard::new()).await;
        assert!(matches!(err, Err(EditorError::NotOpen)));
    }

    #[tokio::test]
    async fn refresh_failure_is_reported() {
        let (svc, mut store) = loaded(vec![input("Logo", "image/png")]).await;
        let notices = NoticeBoard::new();
        svc.fail_next(ServiceError::Network("connection reset".into()));
        refresh(&mut store, &notices).await;
        assert_eq!(notices.latest().unwrap().message, FETCH_FAILED_MESSAGE);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn pending_delete_prompt_and_cancel() {
        let (svc, store) = loaded(vec![input("Logo", "image/png")]).await;
        let editor = AttachmentEditor::new();
        let pending = editor.request_delete(0, &store).unwrap();

        let prompt = pending.prompt();
        assert_eq!(prompt.title, "Are you sure?");
        assert_eq!(
            prompt.body,
            "This will delete the Tracked Attachment. This can't be undone!"
        );
        assert_eq!(prompt.confirm_label, "Delete Logo");

        pending.cancel();
        assert_eq!(svc.calls(), vec![RecordedCall::List]);
    }

    #[tokio::test]
    async fn pending_delete_keeps_rejection_reason() {
        let (svc, mut store) = loaded(vec![input("Logo", "image/png")]).await;
        let notices = NoticeBoard::new();
        let editor = AttachmentEditor::new();
        let mut pending = editor.request_delete(0, &store).unwrap();

        svc.fail_next(ServiceError::Remote("attachment is in use".into()));
        assert!(pending.confirm(&mut store, &notices).await.is_err());
        assert_eq!(pending.error(), Some("attachment is in use"));
        assert_eq!(store.len(), 1);

        pending.confirm(&mut store, &notices).await.unwrap();
        assert!(pending.error().is_none());
        assert!(store.is_empty());
        assert_eq!(notices.latest().unwrap().message, DELETED_MESSAGE);
    }
}
