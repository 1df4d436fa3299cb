use async_trait::async_trait;
use attachdesk_core::attachment::{AttachmentInput, TrackedAttachment};
use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::debug;

use crate::{AttachmentService, ServiceError};

pub const ATTACHMENTS_PATH: &str = "/api/tracked_attachments/";

/// Async HTTP client implementation of AttachmentService.
/// Connects to a running administrative server.
pub struct HttpService {
    base_url: String,
    client: Client,
    api_key: Option<String>,
}

impl HttpService {
    pub fn new(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            base_url,
            client: Client::new(),
            api_key: None,
        }
    }

    pub fn with_api_key(base_url: &str, key: String) -> Self {
        let mut svc = Self::new(base_url);
        svc.api_key = Some(key);
        svc
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn with_auth(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("Authorization", format!("Bearer {key}")),
            None => builder,
        }
    }

    fn collection_url(&self) -> String {
        format!("{}{ATTACHMENTS_PATH}", self.base_url)
    }

    fn item_url(&self, id: i64) -> String {
        format!("{}{ATTACHMENTS_PATH}{id}", self.base_url)
    }

    /// Check that the server answers the attachment listing.
    pub async fn health_check(&self) -> Result<(), ServiceError> {
        let resp = self
            .with_auth(self.client.get(self.collection_url()))
            .send()
            .await
            .map_err(|e| ServiceError::Network(format!("connection failed: {e}")))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(parse_error(resp).await)
        }
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, ServiceError> {
        let resp = self
            .with_auth(builder)
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;
        handle_response(resp).await
    }

    async fn delete_req(&self, url: String) -> Result<(), ServiceError> {
        let resp = self
            .with_auth(self.client.delete(url))
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(parse_error(resp).await)
        }
    }
}

async fn handle_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ServiceError> {
    let status = resp.status();
    if status.is_success() {
        resp.json::<T>()
            .await
            .map_err(|e| ServiceError::Decode(format!("json decode: {e}")))
    } else {
        Err(parse_error_with_status(status, resp).await)
    }
}

async fn parse_error(resp: reqwest::Response) -> ServiceError {
    let status = resp.status();
    parse_error_with_status(status, resp).await
}

async fn parse_error_with_status(status: StatusCode, resp: reqwest::Response) -> ServiceError {
    let body = resp.text().await.unwrap_or_default();
    let msg = envelope_message(&body).unwrap_or_else(|| {
        if body.is_empty() {
            status.to_string()
        } else {
            body
        }
    });
    debug!(%status, message = %msg, "remote call failed");

    match status {
        StatusCode::NOT_FOUND => ServiceError::NotFound(msg),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ServiceError::Validation(msg),
        StatusCode::CONFLICT => ServiceError::Conflict(msg),
        _ => ServiceError::Remote(msg),
    }
}

/// Pulls the operator-facing text out of a `{"success": false, "message": ...}`
/// envelope. Bare `{"error": ...}` bodies are accepted too.
fn envelope_message(body: &str) -> Option<String> {
    let value = serde_json::from_str::<serde_json::Value>(body).ok()?;
    value["message"]
        .as_str()
        .or_else(|| value["error"].as_str())
        .map(String::from)
}

#[async_trait]
impl AttachmentService for HttpService {
    async fn list_attachments(&self) -> Result<Vec<TrackedAttachment>, ServiceError> {
        self.send(self.client.get(self.collection_url())).await
    }

    async fn get_attachment(&self, id: i64) -> Result<TrackedAttachment, ServiceError> {
        self.send(self.client.get(self.item_url(id))).await
    }

    async fn create_attachment(
        &self,
        input: &AttachmentInput,
    ) -> Result<TrackedAttachment, ServiceError> {
        self.send(self.client.post(self.collection_url()).json(input))
            .await
    }

    async fn update_attachment(
        &self,
        id: i64,
        input: &AttachmentInput,
    ) -> Result<TrackedAttachment, ServiceError> {
        let body = TrackedAttachment::from_input(id, input);
        self.send(self.client.put(self.item_url(id)).json(&body))
            .await
    }

    async fn delete_attachment(&self, id: i64) -> Result<(), ServiceError> {
        self.delete_req(self.item_url(id)).await
    }
}
