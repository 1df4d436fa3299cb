use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::data_uri;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedAttachment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub filename: String,
    #[serde(rename = "type", default)]
    pub mime_type: String,
    /// Base64 payload without a media-type prefix.
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_date: Option<DateTime<Utc>>,
}

/// The writable fields of an attachment, as sent on create.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentInput {
    pub name: String,
    #[serde(default)]
    pub filename: String,
    #[serde(rename = "type", default)]
    pub mime_type: String,
    #[serde(default)]
    pub content: String,
}

impl TrackedAttachment {
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Full request body for an update: the input fields carrying `id`.
    pub fn from_input(id: i64, input: &AttachmentInput) -> Self {
        Self {
            id: Some(id),
            name: input.name.clone(),
            filename: input.filename.clone(),
            mime_type: input.mime_type.clone(),
            content: input.content.clone(),
            modified_date: None,
        }
    }

    pub fn input(&self) -> AttachmentInput {
        AttachmentInput {
            name: self.name.clone(),
            filename: self.filename.clone(),
            mime_type: self.mime_type.clone(),
            content: self.content.clone(),
        }
    }

    /// `data:<type>;base64,<content>`, used for previews and downloads.
    pub fn data_uri(&self) -> String {
        data_uri::compose(&self.mime_type, &self.content)
    }

    pub fn modified_display(&self) -> String {
        self.modified_date
            .as_ref()
            .map(format_modified)
            .unwrap_or_default()
    }
}

/// Formats a timestamp as `March 3rd 2024, 4:05:09 pm`.
pub fn format_modified(ts: &DateTime<Utc>) -> String {
    let (pm, hour) = ts.hour12();
    format!(
        "{} {}{} {}, {}:{:02}:{:02} {}",
        ts.format("%B"),
        ts.day(),
        ordinal_suffix(ts.day()),
        ts.year(),
        hour,
        ts.minute(),
        ts.second(),
        if pm { "pm" } else { "am" },
    )
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}
