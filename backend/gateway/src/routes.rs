//! API route handlers.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use parley_core::ChatError;
use parley_engine::RawChatRequest;

use crate::server::AppState;

type ApiError = (StatusCode, Json<Value>);

fn error_body(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

/// Map an engine error onto a status and caller-safe body. Validation
/// failures echo their short message; upstream and internal detail stays in
/// the logs.
fn into_api_error(err: ChatError) -> ApiError {
    if err.is_client_error() {
        return error_body(StatusCode::BAD_REQUEST, err.to_string());
    }
    match err {
        ChatError::Upstream(detail) | ChatError::ToolArgument(detail) => {
            error!(error = %detail, "Upstream failure");
            error_body(StatusCode::BAD_GATEWAY, "Upstream provider failure")
        }
        other => {
            error!(error = %other, "Internal failure");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

/// `POST /api/chat`
pub async fn chat(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(body): Json<RawChatRequest>,
) -> Result<Json<Value>, ApiError> {
    if !state.limiter.allow(&addr.ip().to_string()).await {
        return Err(error_body(
            StatusCode::TOO_MANY_REQUESTS,
            "Too many requests",
        ));
    }

    let content = state.engine.chat(&body).await.map_err(into_api_error)?;
    Ok(Json(json!({
        "id": format!("chatcmpl-{}", uuid::Uuid::new_v4()),
        "object": "chat.completion",
        "created": chrono::Utc::now().timestamp(),
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetRequest {
    #[serde(default)]
    session_id: Option<String>,
}

/// `POST /api/reset`
pub async fn reset(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ResetRequest>,
) -> Result<Json<Value>, ApiError> {
    let found = match body.session_id.as_deref() {
        Some(id) if !id.trim().is_empty() => state.engine.reset(id).await,
        _ => false,
    };
    if found {
        Ok(Json(json!({ "message": "Session reset" })))
    } else {
        Err(error_body(StatusCode::BAD_REQUEST, "Invalid sessionId"))
    }
}

/// `GET /api/models` — the allow-list as `[{id, name}]`.
pub async fn models(State(state): State<Arc<AppState>>) -> Json<Value> {
    let list: Vec<Value> = state
        .engine
        .models()
        .iter()
        .map(|m| json!({ "id": m.id, "name": m.name }))
        .collect();
    Json(Value::Array(list))
}

/// `GET /api/health`
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "parley",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
