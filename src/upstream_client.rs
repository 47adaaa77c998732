use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{domain::sessions::Turn, errors::UpstreamError};

#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Sends the whole conversation and returns the assistant's reply text.
    async fn generate(
        &self,
        model: &str,
        history: &[Turn],
        api_key: &str,
    ) -> Result<String, UpstreamError>;
}

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    input: GenerationInput<'a>,
}

#[derive(Debug, Serialize)]
struct GenerationInput<'a> {
    messages: &'a [Turn],
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    output: GenerationOutput,
}

#[derive(Debug, Deserialize)]
struct GenerationOutput {
    #[serde(default)]
    choices: Vec<GenerationChoice>,
}

#[derive(Debug, Deserialize)]
struct GenerationChoice {
    message: GenerationMessage,
}

#[derive(Debug, Deserialize)]
struct GenerationMessage {
    content: String,
}

/// DashScope text-generation client.
#[derive(Debug, Clone)]
pub struct QwenCloudClient {
    http: reqwest::Client,
    endpoint: String,
}

impl QwenCloudClient {
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, UpstreamError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|err| UpstreamError::Local(format!("failed to build http client: {err}")))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ModelProvider for QwenCloudClient {
    async fn generate(
        &self,
        model: &str,
        history: &[Turn],
        api_key: &str,
    ) -> Result<String, UpstreamError> {
        let request = GenerationRequest {
            model,
            input: GenerationInput { messages: history },
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|err| format!("<unreadable body: {err}>"));
            warn!(status = status.as_u16(), body = %body, "upstream provider rejected request");
            return Err(UpstreamError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await.map_err(classify_transport_error)?;
        extract_reply(&body)
    }
}

fn classify_transport_error(err: reqwest::Error) -> UpstreamError {
    let classified = if err.is_builder() {
        UpstreamError::Local(err.to_string())
    } else if err.is_connect() || err.is_timeout() || err.is_request() {
        UpstreamError::Unreachable(err.to_string())
    } else {
        UpstreamError::Local(err.to_string())
    };

    warn!(error = %classified, "upstream call failed");
    classified
}

/// Pulls `output.choices[0].message.content` out of a successful response body.
fn extract_reply(body: &[u8]) -> Result<String, UpstreamError> {
    let parsed: GenerationResponse = serde_json::from_slice(body)
        .map_err(|err| UpstreamError::Local(format!("malformed provider response: {err}")))?;

    parsed
        .output
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| UpstreamError::Local("provider response contained no choices".to_string()))
}
