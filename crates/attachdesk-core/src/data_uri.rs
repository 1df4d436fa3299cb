//! The `data:<mime>;base64,<payload>` convention used for previews and uploads.

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;

use crate::CoreError;

pub fn compose(mime_type: &str, payload: &str) -> String {
    format!("data:{mime_type};base64,{payload}")
}

/// Split a base64 data URI into `(mime_type, payload)`.
pub fn parse(uri: &str) -> Result<(&str, &str), CoreError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| CoreError::InvalidDataUri("missing data: scheme".into()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| CoreError::InvalidDataUri("missing payload separator".into()))?;
    let mime_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| CoreError::InvalidDataUri(format!("not base64 encoded: {header}")))?;
    Ok((mime_type, payload))
}

pub fn encode_payload(bytes: &[u8]) -> String {
    B64.encode(bytes)
}

pub fn decode_payload(payload: &str) -> Result<Vec<u8>, CoreError> {
    B64.decode(payload)
        .map_err(|e| CoreError::InvalidBase64(e.to_string()))
}
