pub mod attachment;
pub mod data_uri;
pub mod error;
pub mod icon;
pub mod mime;

pub use attachment::{AttachmentInput, TrackedAttachment};
pub use error::CoreError;
