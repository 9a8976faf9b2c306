pub mod app;

pub use crate::config::app::AppConfig;
use confique::Config;
use thiserror::Error;

/// Environment variable naming an optional TOML configuration file
pub const CONFIG_FILE_ENV: &str = "OAUTH_CONFIG_FILE";

#[derive(Debug, Error)]
#[error("{0}")]
pub struct ConfigError(#[from] confique::Error);

/// Main configuration structure for the OAuth server
#[derive(Debug, Config, Clone)]
pub struct ServerConfig {
    /// The port the server will listen to (default: 3000)
    #[config(env = "OAUTH_PORT", default = 3000)]
    pub port: u16,

    /// Prefix all OAuth routes are served under (default: /api/github/oauth)
    #[config(env = "OAUTH_PATH_PREFIX", default = "/api/github/oauth")]
    pub path_prefix: String,

    /// Base URL unmatched requests are forwarded to (default: answer 404)
    #[config(env = "OAUTH_UNHANDLED_UPSTREAM")]
    pub unhandled_upstream: Option<String>,

    /// OAuth app configuration
    #[config(nested)]
    pub app: AppConfig,
}

impl ServerConfig {
    /// Loads the configuration from environment variables, then from the file
    /// named by `OAUTH_CONFIG_FILE` if set. Environment variables win.
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Self::builder().env();
        if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
            builder = builder.file(path);
        }
        Ok(builder.load()?)
    }
}
