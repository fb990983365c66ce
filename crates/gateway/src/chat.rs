//! `POST /api/chat`: authenticated passthrough of the upstream event stream.

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use proto::ValidationError;
use serde_json::{Map, Value, json};
use tracing::{debug, error};

use crate::error::ApiError;
use crate::server::GatewayState;

/// Builds the upstream request body: `messages` (when given), `stream: true`,
/// and `context` defaulting to `{}`.
pub fn upstream_body(incoming: &Map<String, Value>) -> Value {
    let mut body = Map::new();
    if let Some(messages) = incoming.get("messages") {
        body.insert("messages".to_string(), messages.clone());
    }
    body.insert("stream".to_string(), Value::Bool(true));
    let context = match incoming.get("context") {
        Some(ctx) if !ctx.is_null() => ctx.clone(),
        _ => json!({}),
    };
    body.insert("context".to_string(), context);
    Value::Object(body)
}

pub async fn chat(State(state): State<Arc<GatewayState>>, body: Bytes) -> Result<Response, ApiError> {
    let incoming = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(map)) => map,
        _ => return Err(ValidationError::InvalidBody.into()),
    };
    let credential = state.config.chat_credential().inspect_err(|e| {
        error!(route = "chat", error = %e, "Chat credentials missing");
    })?;
    let (name, value) = credential.header();

    debug!(route = "chat", url = %state.config.chat_url, "Forwarding chat request");
    let response = state
        .http
        .post(&state.config.chat_url)
        .header(name, value)
        .json(&upstream_body(&incoming))
        .send()
        .await
        .map_err(|e| {
            error!(route = "chat", error = %e, "Chat upstream unreachable");
            ApiError::Internal("Internal server error".to_string())
        })?;

    let status = response.status();
    if !status.is_success() {
        let message = format!(
            "Thirdweb API error: {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or_default()
        );
        error!(route = "chat", status = status.as_u16(), "Chat upstream rejected request");
        return Err(ApiError::Status {
            status: status.as_u16(),
            message: message.trim_end().to_string(),
        });
    }

    let mut out = Body::from_stream(response.bytes_stream()).into_response();
    let headers = out.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    Ok(out)
}
