//! Collaborators the attachment workflow talks to: global notices, the
//! delete confirmation dialog, and the row model handed to the list renderer.

use std::sync::Mutex;

use async_trait::async_trait;
use attachdesk_core::icon;
use attachdesk_core::TrackedAttachment;
use chrono::{DateTime, Utc};

/// Transient global notices.
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// A `Notifier` that keeps every notice so a renderer can show the latest.
#[derive(Debug, Default)]
pub struct NoticeBoard {
    notices: Mutex<Vec<Notice>>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<Notice> {
        self.lock().last().cloned()
    }

    pub fn all(&self) -> Vec<Notice> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn push(&self, level: NoticeLevel, message: &str) {
        self.lock().push(Notice {
            level,
            message: message.to_string(),
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Notice>> {
        self.notices.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Notifier for NoticeBoard {
    fn success(&self, message: &str) {
        self.push(NoticeLevel::Success, message);
    }

    fn error(&self, message: &str) {
        self.push(NoticeLevel::Error, message);
    }
}

/// What the destructive-action confirmation dialog shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    pub title: String,
    pub body: String,
    pub confirm_label: String,
    /// Rejection reason from the last failed attempt, shown inside the dialog.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmDecision {
    Confirm,
    Cancel,
}

/// Asks the operator to confirm a destructive action.
#[async_trait]
pub trait ConfirmSurface: Send + Sync {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> ConfirmDecision;
}

/// One row of the attachment table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRow {
    /// Position in the store snapshot; stays valid under sorting.
    pub index: usize,
    pub name: String,
    pub icon: &'static str,
    pub modified: String,
    pub modified_at: Option<DateTime<Utc>>,
}

impl AttachmentRow {
    pub fn new(index: usize, attachment: &TrackedAttachment) -> Self {
        Self {
            index,
            name: attachment.name.clone(),
            icon: icon::for_mime(&attachment.mime_type),
            modified: attachment.modified_display(),
            modified_at: attachment.modified_date,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Name,
    Modified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowOrder {
    pub key: SortKey,
    pub ascending: bool,
}

impl Default for RowOrder {
    fn default() -> Self {
        Self {
            key: SortKey::Name,
            ascending: true,
        }
    }
}

impl RowOrder {
    pub fn toggle(self, key: SortKey) -> Self {
        if self.key == key {
            Self {
                key,
                ascending: !self.ascending,
            }
        } else {
            Self {
                key,
                ascending: true,
            }
        }
    }

    pub fn apply(&self, rows: &mut [AttachmentRow]) {
        match self.key {
            SortKey::Name => rows.sort_by(|a, b| {
                a.name
                    .to_lowercase()
                    .cmp(&b.name.to_lowercase())
                    .then(a.index.cmp(&b.index))
            }),
            SortKey::Modified => {
                rows.sort_by(|a, b| a.modified_at.cmp(&b.modified_at).then(a.index.cmp(&b.index)))
            }
        }
        if !self.ascending {
            rows.reverse();
        }
    }
}
