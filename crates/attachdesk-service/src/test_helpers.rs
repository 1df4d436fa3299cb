//! An axum server speaking the tracked-attachment wire contract, backed by
//! `MemoryService`. Used by HTTP client tests here and in the console crate.

use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use attachdesk_core::attachment::{AttachmentInput, TrackedAttachment};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::{AttachmentService, MemoryService, ServiceError};

struct TestState {
    service: Arc<MemoryService>,
    api_key: Option<String>,
}

type SharedState = Arc<TestState>;
type ApiResult<T> = Result<T, (StatusCode, Json<Value>)>;

pub fn test_router(service: Arc<MemoryService>, api_key: Option<String>) -> Router {
    let state = Arc::new(TestState { service, api_key });
    Router::new()
        .route(
            "/api/tracked_attachments/",
            get(list_attachments).post(create_attachment),
        )
        .route(
            "/api/tracked_attachments/{id}",
            get(get_attachment)
                .put(update_attachment)
                .delete(delete_attachment),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_key))
        .with_state(state)
}

/// A running test server with base_url and background task handle.
pub struct TestServer {
    pub base_url: String,
    pub service: Arc<MemoryService>,
    _handle: tokio::task::JoinHandle<()>,
}

/// Spawn an axum test server on a random port with no authentication.
pub async fn spawn_test_server() -> TestServer {
    spawn_with(Arc::new(MemoryService::new()), None).await
}

/// Spawn a test server that requires `Authorization: Bearer <api_key>`.
pub async fn spawn_test_server_with_key(api_key: &str) -> TestServer {
    spawn_with(Arc::new(MemoryService::new()), Some(api_key.to_string())).await
}

pub async fn spawn_with(service: Arc<MemoryService>, api_key: Option<String>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{addr}");
    let app = test_router(service.clone(), api_key);
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestServer {
        base_url,
        service,
        _handle: handle,
    }
}

async fn require_key(State(state): State<SharedState>, req: Request, next: Next) -> Response {
    if let Some(expected) = &state.api_key {
        let authorized = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == format!("Bearer {expected}"));
        if !authorized {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "success": false, "message": "Invalid API Key" })),
            )
                .into_response();
        }
    }
    next.run(req).await
}

async fn list_attachments(State(state): State<SharedState>) -> ApiResult<Json<Value>> {
    state
        .service
        .list_attachments()
        .await
        .map(|list| Json(json!(list)))
        .map_err(to_error)
}

async fn get_attachment(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    state
        .service
        .get_attachment(id)
        .await
        .map(|a| Json(json!(a)))
        .map_err(to_error)
}

async fn create_attachment(
    State(state): State<SharedState>,
    Json(input): Json<AttachmentInput>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    state
        .service
        .create_attachment(&input)
        .await
        .map(|a| (StatusCode::CREATED, Json(json!(a))))
        .map_err(to_error)
}

async fn update_attachment(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(body): Json<TrackedAttachment>,
) -> ApiResult<Json<Value>> {
    if body.id != Some(id) {
        return Err(to_error(ServiceError::Validation(
            "/:id and /:tracked_attachment_id mismatch".into(),
        )));
    }
    state
        .service
        .update_attachment(id, &body.input())
        .await
        .map(|a| Json(json!(a)))
        .map_err(to_error)
}

async fn delete_attachment(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    state
        .service
        .delete_attachment(id)
        .await
        .map(|_| {
            Json(json!({
                "success": true,
                "message": "Tracked Attachment Deleted Successfully",
            }))
        })
        .map_err(to_error)
}

fn to_error(e: ServiceError) -> (StatusCode, Json<Value>) {
    let status = match &e {
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        ServiceError::Conflict(_) => StatusCode::CONFLICT,
        ServiceError::Remote(_) | ServiceError::Network(_) | ServiceError::Decode(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(json!({ "success": false, "message": e.message(), "data": null })),
    )
}
