use std::{
    env,
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use thiserror::Error;

pub const DEFAULT_MODEL: &str = "qwen-max";
pub const DOTENV_FILE: &str = ".env";
pub const DEFAULT_UPSTREAM_ENDPOINT: &str =
    "https://dashscope.aliyuncs.com/api/v1/services/aigc/text-generation/generation";

#[derive(Debug, Clone)]
pub struct Config {
    pub default_model: String,
    pub default_api_key: Option<String>,
    pub upstream_endpoint: String,
    pub upstream_timeout: Option<Duration>,
    pub bind_addr: String,
    pub bind_port: u16,
    pub access_token: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PORT must be a valid u16")]
    InvalidPort,
    #[error("UPSTREAM_TIMEOUT_SECS must be a positive integer")]
    InvalidTimeout,
    #[error("QWEN_CLOUD_ENDPOINT must be an http(s) URL")]
    InvalidEndpoint,
    #[error("invalid bind address or port")]
    InvalidSocket,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let default_model =
            non_empty_var("DEFAULT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let default_api_key = non_empty_var("QWEN_API_KEY");

        let upstream_endpoint = non_empty_var("QWEN_CLOUD_ENDPOINT")
            .unwrap_or_else(|| DEFAULT_UPSTREAM_ENDPOINT.to_string());
        if !upstream_endpoint.starts_with("http://") && !upstream_endpoint.starts_with("https://") {
            return Err(ConfigError::InvalidEndpoint);
        }

        let upstream_timeout = non_empty_var("UPSTREAM_TIMEOUT_SECS")
            .map(|value| {
                value
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .map(Duration::from_secs)
                    .ok_or(ConfigError::InvalidTimeout)
            })
            .transpose()?;

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string());
        let bind_port = env::var("PORT")
            .ok()
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(4000);

        let config = Self {
            default_model,
            default_api_key,
            upstream_endpoint,
            upstream_timeout,
            bind_addr,
            bind_port,
            access_token: non_empty_var("MCP_API_TOKEN"),
        };

        let _ = config.bind_socket()?;
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }
}

/// Loads variables from a dotenv file into the process environment.
///
/// Variables already set in the environment win. A missing or unreadable
/// file is not an error; `None` means nothing was loaded.
pub fn load_dotenv(path: &Path) -> Option<PathBuf> {
    dotenvy::from_path(path).ok().map(|()| path.to_path_buf())
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    // Tests in this module share process environment.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for name in [
            "DEFAULT_MODEL",
            "QWEN_API_KEY",
            "QWEN_CLOUD_ENDPOINT",
            "UPSTREAM_TIMEOUT_SECS",
            "BIND_ADDR",
            "PORT",
            "MCP_API_TOKEN",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    fn parse_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        clear_env();

        let config = Config::from_env().expect("config should parse");
        assert_eq!(config.default_model, "qwen-max");
        assert_eq!(config.default_api_key, None);
        assert_eq!(config.upstream_endpoint, DEFAULT_UPSTREAM_ENDPOINT);
        assert_eq!(config.upstream_timeout, None);
        assert_eq!(config.bind_addr, "0.0.0.0");
        assert_eq!(config.bind_port, 4000);
        assert_eq!(config.access_token, None);
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        clear_env();
        env::set_var("QWEN_API_KEY", "   ");
        env::set_var("DEFAULT_MODEL", "qwen-turbo");

        let config = Config::from_env().expect("config should parse");
        assert_eq!(config.default_api_key, None);
        assert_eq!(config.default_model, "qwen-turbo");
        clear_env();
    }

    #[test]
    fn invalid_port_fails() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        clear_env();
        env::set_var("PORT", "not-a-port");

        let err = Config::from_env().expect_err("expected invalid port error");
        assert!(matches!(err, ConfigError::InvalidPort));
        clear_env();
    }

    #[test]
    fn timeout_parses_when_positive() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        clear_env();
        env::set_var("UPSTREAM_TIMEOUT_SECS", "30");

        let config = Config::from_env().expect("config should parse");
        assert_eq!(config.upstream_timeout, Some(Duration::from_secs(30)));

        env::set_var("UPSTREAM_TIMEOUT_SECS", "0");
        let err = Config::from_env().expect_err("expected invalid timeout error");
        assert!(matches!(err, ConfigError::InvalidTimeout));
        clear_env();
    }

    #[test]
    fn dotenv_file_feeds_config_without_overriding_environment() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        clear_env();
        env::set_var("QWEN_API_KEY", "from-environment");

        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(DOTENV_FILE);
        std::fs::write(
            &path,
            "DEFAULT_MODEL=qwen-plus\nPORT=4100\nQWEN_API_KEY=from-file\n",
        )
        .expect("write dotenv file");

        assert_eq!(load_dotenv(&path), Some(path.clone()));
        let config = Config::from_env().expect("config should parse");
        assert_eq!(config.default_model, "qwen-plus");
        assert_eq!(config.bind_port, 4100);
        assert_eq!(config.default_api_key.as_deref(), Some("from-environment"));
        clear_env();
    }

    #[test]
    fn missing_dotenv_file_is_ignored() {
        let dir = tempfile::tempdir().expect("temp dir");

        assert_eq!(load_dotenv(&dir.path().join(DOTENV_FILE)), None);
    }

    #[test]
    fn endpoint_must_be_http() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        clear_env();
        env::set_var("QWEN_CLOUD_ENDPOINT", "ftp://example.com");

        let err = Config::from_env().expect_err("expected invalid endpoint error");
        assert!(matches!(err, ConfigError::InvalidEndpoint));
        clear_env();
    }
}
