use std::sync::Mutex;

use async_trait::async_trait;

use crate::{domain::sessions::Turn, errors::UpstreamError, upstream_client::ModelProvider};

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub history: Vec<Turn>,
    pub api_key: String,
}

/// Provider stub that returns a canned outcome and records every call.
pub struct MockProvider {
    outcome: Result<String, UpstreamError>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockProvider {
    pub fn replying(reply: &str) -> Self {
        Self {
            outcome: Ok(reply.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: UpstreamError) -> Self {
        Self {
            outcome: Err(error),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("mock provider lock").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("mock provider lock").len()
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    async fn generate(
        &self,
        model: &str,
        history: &[Turn],
        api_key: &str,
    ) -> Result<String, UpstreamError> {
        self.calls
            .lock()
            .expect("mock provider lock")
            .push(RecordedCall {
                model: model.to_string(),
                history: history.to_vec(),
                api_key: api_key.to_string(),
            });
        self.outcome.clone()
    }
}
