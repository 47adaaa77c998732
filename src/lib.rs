use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub mod auth;
pub mod config;
pub mod domain;
pub mod errors;
pub mod http;
pub mod logging;
pub mod mcp;
pub mod upstream_client;

#[cfg(test)]
pub(crate) mod test_support;

use domain::sessions::SessionStore;
use upstream_client::ModelProvider;

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub model_provider: Arc<dyn ModelProvider>,
    pub default_model: Arc<str>,
    pub default_api_key: Option<Arc<str>>,
    pub access_token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(
        default_model: String,
        default_api_key: Option<String>,
        model_provider: Arc<dyn ModelProvider>,
    ) -> Self {
        Self {
            sessions: Arc::new(SessionStore::new()),
            model_provider,
            default_model: Arc::<str>::from(default_model),
            default_api_key: default_api_key.map(Arc::<str>::from),
            access_token: None,
        }
    }

    pub fn with_access_token(mut self, access_token: Option<String>) -> Self {
        self.access_token = access_token.map(Arc::<str>::from);
        self
    }
}

pub fn build_app(state: AppState) -> Router {
    let protected = Router::new()
        .route("/", post(http::handlers::mcp_endpoint))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer_token,
        ));

    Router::new()
        .route("/health", get(http::handlers::health))
        .merge(protected)
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state)
}
