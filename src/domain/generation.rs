//! `model/generate`: conversational generation against the upstream provider

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::{
    domain::sessions::{Role, Turn},
    errors::AppError,
    AppState,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateParams {
    pub prompt: Option<String>,
    /// Kept loose: anything that is not the id of a live session starts a new one.
    pub session_id: Option<Value>,
    pub model: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct GenerateResult {
    pub choices: Vec<GenerateChoice>,
    pub model: String,
    pub session: String,
}

#[derive(Debug, PartialEq, Eq)]
pub struct GenerateChoice {
    pub message: Turn,
}

impl GenerateResult {
    /// Wire shape: `{ choices: [{ message: { role, content } }], model, session }`.
    pub fn into_value(self) -> Value {
        let choices = self
            .choices
            .into_iter()
            .map(|choice| {
                json!({
                    "message": {
                        "role": choice.message.role.as_str(),
                        "content": choice.message.content,
                    }
                })
            })
            .collect::<Vec<_>>();

        json!({
            "choices": choices,
            "model": self.model,
            "session": self.session,
        })
    }
}

pub async fn generate(state: &AppState, params: GenerateParams) -> Result<GenerateResult, AppError> {
    let prompt = params
        .prompt
        .filter(|prompt| !prompt.is_empty())
        .ok_or_else(|| AppError::validation("prompt required"))?;

    let api_key = params
        .api_key
        .filter(|key| !key.trim().is_empty())
        .or_else(|| state.default_api_key.as_deref().map(str::to_string))
        .ok_or_else(|| {
            AppError::validation("API key required (parameter or environment variable)")
        })?;

    let model = params
        .model
        .filter(|model| !model.trim().is_empty())
        .unwrap_or_else(|| state.default_model.to_string());

    let requested = params.session_id.as_ref().and_then(Value::as_str);
    let session_id = state.sessions.resolve_or_create(requested).await;
    if requested.is_some_and(|id| id != session_id) {
        debug!(requested = ?requested, session_id = %session_id, "unknown session replaced");
    }

    let history = state.sessions.append(&session_id, Turn::user(prompt)).await?;
    let reply = state
        .model_provider
        .generate(&model, &history, &api_key)
        .await?;

    if let Err(err) = state
        .sessions
        .append(&session_id, Turn::assistant(reply.clone()))
        .await
    {
        warn!(session_id = %session_id, error = %err, "session removed during generation; reply not recorded");
    }

    Ok(GenerateResult {
        choices: vec![GenerateChoice {
            message: Turn {
                role: Role::Assistant,
                content: reply,
            },
        }],
        model,
        session: session_id,
    })
}
