//! Axum HTTP handlers for the gateway
//!
//! Provides the MCP endpoint and the health check.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::mcp::rpc::{parse_error, McpRequest};
use crate::mcp::server::handle_mcp_request;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: i64,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().timestamp_millis(),
    })
}

/// MCP replies always travel with 200; failures live inside the envelope.
/// Bodies without a `method` are not MCP traffic and get 404.
pub async fn mcp_endpoint(State(state): State<AppState>, body: Bytes) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(_) => return (StatusCode::OK, Json(parse_error())).into_response(),
    };

    let Some(request) = McpRequest::from_payload(payload) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let response = handle_mcp_request(&state, request).await;
    (StatusCode::OK, Json(response)).into_response()
}
