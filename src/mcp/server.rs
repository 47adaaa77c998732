//! The MCP dispatcher
//!
//! Routes a decoded request to one of the four supported methods and turns
//! whatever happens into exactly one JSON-RPC response.

use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::domain::{generation::generate, tools::execute_tool};
use crate::mcp::rpc::{internal_error, json_rpc_result, McpRequest};
use crate::{errors::AppError, AppState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McpMethod {
    SessionCreate,
    SessionDelete,
    ModelGenerate,
    ToolExecute,
}

impl McpMethod {
    pub fn parse(method: &str) -> Option<Self> {
        match method {
            "session/create" => Some(Self::SessionCreate),
            "session/delete" => Some(Self::SessionDelete),
            "model/generate" => Some(Self::ModelGenerate),
            "tool/execute" => Some(Self::ToolExecute),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionDeleteParams {
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct ToolExecuteParams {
    tool: String,
    #[serde(default)]
    parameters: Value,
}

pub async fn handle_mcp_request(state: &AppState, request: McpRequest) -> Value {
    let McpRequest { id, method, params } = request;
    let audit_params = redact_audit_params(params.as_ref());

    match dispatch(state, &method, params).await {
        Ok(result) => {
            info!(
                method = %method,
                params = %audit_params,
                outcome = "success",
                "mcp action audited"
            );
            json_rpc_result(id, result)
        }
        Err(err) => {
            warn!(
                method = %method,
                params = %audit_params,
                outcome = "failure",
                error_kind = err.kind(),
                error = %err,
                "mcp action audited"
            );
            internal_error(id, &err)
        }
    }
}

pub async fn dispatch(
    state: &AppState,
    method: &str,
    params: Option<Value>,
) -> Result<Value, AppError> {
    let Some(method) = McpMethod::parse(method) else {
        return Err(AppError::validation(format!("unsupported method: {method}")));
    };

    match method {
        McpMethod::SessionCreate => {
            let session_id = state.sessions.create().await;
            Ok(json!({ "sessionId": session_id }))
        }
        McpMethod::SessionDelete => {
            let params: SessionDeleteParams = parse_params(params)?;
            state.sessions.delete(&params.session_id).await?;
            Ok(json!({ "success": true }))
        }
        McpMethod::ModelGenerate => {
            let result = generate(state, parse_params(params)?).await?;
            Ok(result.into_value())
        }
        McpMethod::ToolExecute => {
            let params: ToolExecuteParams = parse_params(params)?;
            execute_tool(&params.tool, params.parameters)
        }
    }
}

/// Absent and `null` params both read as an empty object.
fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, AppError> {
    let value = match params {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(value) => value,
    };

    serde_json::from_value(value)
        .map_err(|err| AppError::validation(format!("invalid params: {err}")))
}

pub fn redact_audit_params(params: Option<&Value>) -> Value {
    params.map(redact_audit_value).unwrap_or(Value::Null)
}

pub fn redact_audit_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| {
                    if is_sensitive_key(key) {
                        (key.clone(), Value::String("[REDACTED]".to_string()))
                    } else {
                        (key.clone(), redact_audit_value(item))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_audit_value).collect()),
        _ => value.clone(),
    }
}

pub fn is_sensitive_key(key: &str) -> bool {
    let normalized = key.trim().to_ascii_lowercase().replace(['_', '-'], "");
    matches!(
        normalized.as_str(),
        "apikey" | "authorization" | "bearer" | "credentials" | "credential"
    ) || normalized.contains("token")
        || normalized.contains("secret")
        || normalized.contains("password")
}
