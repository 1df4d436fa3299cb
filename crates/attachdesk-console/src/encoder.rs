use std::path::{Path, PathBuf};

use attachdesk_core::{data_uri, mime, CoreError};
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use thiserror::Error;
use tracing::{debug, warn};

/// A file handed over by the file picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
    pub mime_type: String,
}

impl SelectedFile {
    /// Describe a file on disk the way a picker would: base name plus a MIME
    /// type guessed from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mime_type = mime::guess(&name).to_string();
        Self {
            path,
            name,
            mime_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFile {
    pub filename: String,
    pub mime_type: String,
    pub base64: String,
}

impl EncodedFile {
    pub fn data_uri(&self) -> String {
        data_uri::compose(&self.mime_type, &self.base64)
    }

    pub fn decode(&self) -> Result<Vec<u8>, CoreError> {
        data_uri::decode_payload(&self.base64)
    }
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Turns picked files into base64 payloads for preview and upload.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileEncoder;

impl FileEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Read `file` without blocking and encode its bytes. Failures are logged
    /// and returned; there is no retry.
    pub async fn encode(&self, file: &SelectedFile) -> Result<EncodedFile, EncodeError> {
        match tokio::fs::read(&file.path).await {
            Ok(bytes) => {
                debug!(file = %file.name, size = bytes.len(), "encoded attachment file");
                Ok(self.encode_bytes(&file.name, &file.mime_type, &bytes))
            }
            Err(source) => {
                warn!(file = %file.path.display(), error = %source, "file read failed");
                Err(EncodeError::Read {
                    path: file.path.display().to_string(),
                    source,
                })
            }
        }
    }

    pub fn encode_bytes(&self, filename: &str, mime_type: &str, bytes: &[u8]) -> EncodedFile {
        EncodedFile {
            filename: filename.to_string(),
            mime_type: mime_type.to_string(),
            base64: B64.encode(bytes),
        }
    }
}
