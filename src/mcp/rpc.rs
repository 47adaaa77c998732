//! JSON-RPC request and response envelopes
//!
//! Every handler failure is reported with the same code and message; the
//! cause travels in `error.data`.

use rust_mcp_sdk::schema::{
    JsonrpcErrorResponse, JsonrpcResultResponse, RequestId, Result as McpResult, RpcError,
};
use serde_json::{json, Map, Value};

use crate::errors::AppError;

pub const INTERNAL_ERROR_CODE: i32 = -32603;
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Error";
pub const PARSE_ERROR_CODE: i32 = -32700;

#[derive(Debug, Clone, PartialEq)]
pub struct McpRequest {
    /// Echoed back verbatim; `null` when the caller sent none.
    pub id: Value,
    pub method: String,
    pub params: Option<Value>,
}

impl McpRequest {
    /// Interprets a decoded body as an MCP request.
    ///
    /// Returns `None` when the body carries no truthy `method`, meaning it is
    /// not addressed to the dispatcher at all.
    pub fn from_payload(payload: Value) -> Option<Self> {
        let Value::Object(mut object) = payload else {
            return None;
        };

        let method = match object.remove("method")? {
            Value::Null | Value::Bool(false) => return None,
            Value::Number(number) if number.as_f64() == Some(0.0) => return None,
            Value::String(method) if method.is_empty() => return None,
            Value::String(method) => method,
            other => other.to_string(),
        };

        Some(Self {
            id: object.remove("id").unwrap_or(Value::Null),
            method,
            params: object.remove("params"),
        })
    }
}

pub fn is_json_rpc_error(value: &Value) -> bool {
    value.get("error").is_some()
}

pub fn internal_error(id: Value, err: &AppError) -> Value {
    json_rpc_error_with_data(
        id,
        INTERNAL_ERROR_CODE,
        INTERNAL_ERROR_MESSAGE,
        Some(Value::String(err.to_string())),
    )
}

pub fn parse_error() -> Value {
    json_rpc_error_with_data(Value::Null, PARSE_ERROR_CODE, "Parse error", None)
}

/// Ids the SDK cannot represent (null, floats, nested values) are echoed
/// through a plain `json!` envelope instead.
pub fn json_rpc_error_with_data(
    id: Value,
    code: i32,
    message: &str,
    data: Option<Value>,
) -> Value {
    if let Some(request_id) = value_to_request_id(&id) {
        let response = JsonrpcErrorResponse::new(
            RpcError {
                code: i64::from(code),
                data: data.clone(),
                message: message.to_string(),
            },
            Some(request_id),
        );
        if let Ok(value) = serde_json::to_value(response) {
            return value;
        }
    }

    let mut error = Map::from_iter([
        ("code".to_string(), json!(code)),
        ("message".to_string(), json!(message)),
    ]);
    if let Some(data) = data {
        error.insert("data".to_string(), data);
    }

    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": error
    })
}

pub fn json_rpc_result(id: Value, result: Value) -> Value {
    if let (Some(request_id), Some(extra)) = (value_to_request_id(&id), result.as_object()) {
        let response = JsonrpcResultResponse::new(
            request_id,
            McpResult {
                meta: None,
                extra: Some(extra.clone()),
            },
        );
        if let Ok(value) = serde_json::to_value(response) {
            return value;
        }
    }

    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

pub fn value_to_request_id(value: &Value) -> Option<RequestId> {
    if let Some(string_id) = value.as_str() {
        return Some(RequestId::String(string_id.to_string()));
    }

    value.as_i64().map(RequestId::Integer)
}
