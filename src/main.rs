use std::{path::Path, sync::Arc};

use qwen_mcp_gateway::{
    build_app,
    config::{self, Config},
    logging, upstream_client::QwenCloudClient, AppState,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    if let Some(path) = config::load_dotenv(Path::new(config::DOTENV_FILE)) {
        info!(path = %path.display(), "loaded environment file");
    }
    let config = Config::from_env()?;
    let provider = Arc::new(QwenCloudClient::new(
        config.upstream_endpoint.clone(),
        config.upstream_timeout,
    )?);
    let bind_socket = config.bind_socket()?;

    if config.default_api_key.is_none() {
        warn!("QWEN_API_KEY is not set; every model/generate call must supply apiKey");
    }

    let state = AppState::new(
        config.default_model.clone(),
        config.default_api_key.clone(),
        provider.clone(),
    )
    .with_access_token(config.access_token.clone());
    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(bind_socket).await?;

    info!(
        bind_addr = %config.bind_addr,
        bind_port = config.bind_port,
        default_model = %config.default_model,
        upstream = %provider.endpoint(),
        "gateway starting; MCP on / and health on /health"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
