//! End-to-end editor scenarios through the public API, backed by
//! MemoryService.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use attachdesk_console::editor::{
    AttachmentEditor, DeleteOutcome, Draft, EditorMode, EditorState, SubmitOutcome,
    ADDED_MESSAGE, DELETED_MESSAGE,
};
use attachdesk_console::encoder::{FileEncoder, SelectedFile};
use attachdesk_console::store::AttachmentStore;
use attachdesk_console::surface::{
    ConfirmDecision, ConfirmPrompt, ConfirmSurface, NoticeBoard, NoticeLevel,
};
use attachdesk_core::attachment::AttachmentInput;
use attachdesk_service::{MemoryService, RecordedCall, ServiceError};
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;

fn input(name: &str, mime: &str) -> AttachmentInput {
    AttachmentInput {
        name: name.into(),
        filename: format!("{}.bin", name.to_lowercase()),
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

/// Answers prompts from a script and remembers what it was shown.
struct ScriptedConfirm {
    answers: Mutex<Vec<ConfirmDecision>>,
    shown: Mutex<Vec<ConfirmPrompt>>,
}

impl ScriptedConfirm {
    fn new(answers: &[ConfirmDecision]) -> Self {
        let mut answers = answers.to_vec();
        answers.reverse();
        Self {
            answers: Mutex::new(answers),
            shown: Mutex::new(Vec::new()),
        }
    }

    fn shown(&self) -> Vec<ConfirmPrompt> {
        self.shown.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConfirmSurface for ScriptedConfirm {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> ConfirmDecision {
        self.shown.lock().unwrap().push(prompt.clone());
        self.answers
            .lock()
            .unwrap()
            .pop()
            .unwrap_or(ConfirmDecision::Cancel)
    }
}

#[tokio::test]
async fn create_with_picked_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("invoice.pdf");
    let bytes = b"%PDF-1.4 invoice";
    std::fs::write(&path, bytes).unwrap();

    let (svc, mut store) = loaded(vec![]).await;
    let notices = NoticeBoard::new();
    let mut editor = AttachmentEditor::new();

    editor.open(EditorMode::Create, &store).unwrap();
    editor.set_name("Invoice");
    editor
        .attach(&SelectedFile::from_path(&path), &FileEncoder::new())
        .await
        .unwrap();
    assert_eq!(editor.preview_icon(), "fa-file-pdf-o");

    let outcome = editor.submit(&mut store, &notices).await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Saved(_)));

    let expected = AttachmentInput {
        name: "Invoice".into(),
        filename: "invoice.pdf".into(),
        mime_type: "application/pdf".into(),
        content: B64.encode(bytes),
    };
    assert_eq!(
        svc.calls(),
        vec![
            RecordedCall::List,
            RecordedCall::Create(expected.clone()),
            RecordedCall::List,
        ]
    );

    // Closed, cleared, and the list reflects the new entity.
    assert_eq!(editor.state(), EditorState::Closed);
    assert_eq!(editor.draft(), &Draft::default());
    assert_eq!(store.len(), 1);
    assert_eq!(store.items()[0].input(), expected);

    let notice = notices.latest().unwrap();
    assert_eq!(notice.level, NoticeLevel::Success);
    assert_eq!(notice.message, ADDED_MESSAGE);
}

#[tokio::test]
async fn unreadable_file_leaves_draft_alone() {
    let dir = tempfile::tempdir().unwrap();
    let (_svc, store) = loaded(vec![input("Logo", "image/png")]).await;
    let mut editor = AttachmentEditor::new();
    editor.open(EditorMode::Edit(0), &store).unwrap();
    let before = editor.draft().clone();

    let missing = SelectedFile::from_path(dir.path().join("gone.txt"));
    assert!(editor.attach(&missing, &FileEncoder::new()).await.is_err());
    assert_eq!(editor.draft(), &before);
}

#[tokio::test]
async fn remote_validation_failure_stays_in_dialog() {
    let (svc, mut store) = loaded(vec![]).await;
    let notices = NoticeBoard::new();
    let mut editor = AttachmentEditor::new();
    editor.open(EditorMode::Create, &store).unwrap();
    editor.set_name("Invoice");

    svc.fail_next(ServiceError::Validation("name is required".into()));
    let outcome = editor.submit(&mut store, &notices).await.unwrap();

    assert_eq!(outcome, SubmitOutcome::Rejected("name is required".into()));
    assert!(editor.is_open());
    assert_eq!(editor.error(), Some("name is required"));
    assert_eq!(editor.draft().name, "Invoice");
    assert!(notices.latest().is_none());
}

#[tokio::test]
async fn edit_preview_icon_follows_type() {
    let (_svc, store) = loaded(vec![
        input("Alpha", "text/plain"),
        input("Bravo", "application/pdf"),
        input("Logo", "image/png"),
        input("Blob", "application/weird"),
    ])
    .await;
    let mut editor = AttachmentEditor::new();

    editor.open(EditorMode::Edit(2), &store).unwrap();
    assert_eq!(editor.preview_icon(), "fa-file-image-o");

    editor.open(EditorMode::Edit(3), &store).unwrap();
    assert_eq!(editor.preview_icon(), "fa-file-o");
}

#[tokio::test]
async fn copy_never_targets_source() {
    let (svc, mut store) = loaded(vec![input("Logo", "image/png")]).await;
    let source = store.get(0).unwrap().clone();
    let mut editor = AttachmentEditor::new();

    editor.open(EditorMode::Copy(0), &store).unwrap();
    assert_eq!(editor.target_id(), None);
    assert_eq!(editor.draft().name, "Copy of Logo");
    let file = editor.draft().file.clone().unwrap();
    assert_eq!(file.filename, source.filename);
    assert_eq!(file.mime_type, source.mime_type);
    assert_eq!(file.content, source.content);

    editor
        .submit(&mut store, &NoticeBoard::new())
        .await
        .unwrap();
    assert!(svc
        .calls()
        .iter()
        .all(|c| !matches!(c, RecordedCall::Update(..))));
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn delete_confirmed() {
    let (svc, mut store) = loaded(vec![input("Logo", "image/png")]).await;
    let id = store.get(0).unwrap().id.unwrap();
    let notices = NoticeBoard::new();
    let surface = ScriptedConfirm::new(&[ConfirmDecision::Confirm]);

    let outcome = AttachmentEditor::new()
        .delete(0, &mut store, &surface, &notices)
        .await
        .unwrap();

    assert_eq!(outcome, DeleteOutcome::Deleted);
    assert!(store.is_empty());
    assert!(svc.calls().contains(&RecordedCall::Delete(id)));
    assert_eq!(notices.latest().unwrap().message, DELETED_MESSAGE);
    assert_eq!(surface.shown()[0].confirm_label, "Delete Logo");
}

#[tokio::test]
async fn delete_cancelled_makes_no_call() {
    let (svc, mut store) = loaded(vec![input("Logo", "image/png")]).await;
    let surface = ScriptedConfirm::new(&[ConfirmDecision::Cancel]);

    let outcome = AttachmentEditor::new()
        .delete(0, &mut store, &surface, &NoticeBoard::new())
        .await
        .unwrap();

    assert_eq!(outcome, DeleteOutcome::Cancelled);
    assert_eq!(svc.calls(), vec![RecordedCall::List]);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn delete_failure_is_shown_then_retried() {
    let (svc, mut store) = loaded(vec![input("Logo", "image/png")]).await;
    let surface = ScriptedConfirm::new(&[ConfirmDecision::Confirm, ConfirmDecision::Confirm]);
    let notices = NoticeBoard::new();

    svc.fail_next(ServiceError::Remote("attachment is in use".into()));
    let outcome = AttachmentEditor::new()
        .delete(0, &mut store, &surface, &notices)
        .await
        .unwrap();

    assert_eq!(outcome, DeleteOutcome::Deleted);
    let shown = surface.shown();
    assert_eq!(shown.len(), 2);
    assert_eq!(shown[0].error, None);
    assert_eq!(shown[1].error.as_deref(), Some("attachment is in use"));
    assert!(store.is_empty());
}

#[tokio::test]
async fn delete_failure_then_cancel_keeps_entity() {
    let (svc, mut store) = loaded(vec![input("Logo", "image/png")]).await;
    let surface = ScriptedConfirm::new(&[ConfirmDecision::Confirm, ConfirmDecision::Cancel]);

    svc.fail_next(ServiceError::Remote("attachment is in use".into()));
    let outcome = AttachmentEditor::new()
        .delete(0, &mut store, &surface, &NoticeBoard::new())
        .await
        .unwrap();

    assert_eq!(outcome, DeleteOutcome::Cancelled);
    assert_eq!(svc.len(), 1);
}
