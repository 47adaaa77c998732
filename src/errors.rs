use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("session not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("unauthorized: {message}")]
    Unauthorized {
        code: &'static str,
        message: &'static str,
    },
}

/// Failure modes of a single call to the upstream model provider.
///
/// The three variants stay distinct all the way to the dispatcher, which only
/// flattens them when writing the wire envelope.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// The provider answered with a non-2xx status.
    #[error("upstream provider error: {status} - {body}")]
    Rejected { status: u16, body: String },
    /// The request went out but no response came back.
    #[error("could not connect to upstream provider: {0}")]
    Unreachable(String),
    #[error("upstream request failed: {0}")]
    Local(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub details: serde_json::Value,
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(session_id: impl Into<String>) -> Self {
        Self::NotFound(session_id.into())
    }

    pub fn unauthorized(code: &'static str, message: &'static str) -> Self {
        Self::Unauthorized { code, message }
    }

    /// Short label used in audit logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::Upstream(UpstreamError::Rejected { .. }) => "upstream_rejected",
            Self::Upstream(UpstreamError::Unreachable(_)) => "upstream_unreachable",
            Self::Upstream(UpstreamError::Local(_)) => "upstream_local",
            Self::Unauthorized { .. } => "unauthorized",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::Unauthorized { code, message } => {
                (StatusCode::UNAUTHORIZED, code, message.to_string())
            }
            // The dispatcher turns these into JSON-RPC envelopes; reaching axum means a bug.
            other => {
                tracing::error!(error = %other, "request failed with internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal server error".to_string(),
                )
            }
        };

        (
            status,
            Json(ErrorResponse {
                code: code.to_string(),
                message,
                details: json!({}),
            }),
        )
            .into_response()
    }
}
