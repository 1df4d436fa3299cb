use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid data uri: {0}")]
    InvalidDataUri(String),

    #[error("invalid base64: {0}")]
    InvalidBase64(String),
}
