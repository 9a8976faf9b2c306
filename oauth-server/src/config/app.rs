use std::sync::Arc;
use std::time::Duration;

use confique::Config;
use oauth_app::{AppError, ClientType, GitHubApp, GitHubAppBuilder, Logger};

/// Configuration of the GitHub OAuth app the server fronts
#[derive(Debug, Config, Clone)]
pub struct AppConfig {
    /// "oauth-app" or "github-app" (default: oauth-app)
    #[config(env = "OAUTH_CLIENT_TYPE", default = "oauth-app")]
    pub client_type: ClientType,

    /// Client id of the app - mandatory
    #[config(env = "OAUTH_CLIENT_ID")]
    pub client_id: String,

    /// Client secret of the app - mandatory
    #[config(env = "OAUTH_CLIENT_SECRET")]
    pub client_secret: String,

    /// Scopes requested on login when none are passed, comma-separated
    /// (OAuth apps only, default: none)
    #[config(
        env = "OAUTH_DEFAULT_SCOPES",
        parse_env = confique::env::parse::list_by_comma,
        default = []
    )]
    pub default_scopes: Vec<String>,

    /// Whether unauthenticated users may sign up during login (default: GitHub's choice)
    #[config(env = "OAUTH_ALLOW_SIGNUP")]
    pub allow_signup: Option<bool>,

    /// GitHub Enterprise Server REST root, e.g. https://ghe.example.com/api/v3
    #[config(env = "OAUTH_BASE_URL")]
    pub base_url: Option<String>,

    /// Timeout for requests sent to GitHub in seconds (default: 10)
    #[config(env = "OAUTH_REQUEST_TIMEOUT", default = 10)]
    pub request_timeout: u64,
}

impl AppConfig {
    /// Builds the GitHub app described by this configuration
    pub fn build_app(&self, log: Arc<dyn Logger>) -> Result<GitHubApp, AppError> {
        let mut builder = GitHubAppBuilder::new()
            .with_credentials(&self.client_id, &self.client_secret)
            .with_client_type(self.client_type)
            .with_default_scopes(self.default_scopes.clone())
            .with_timeout(Duration::from_secs(self.request_timeout))
            .with_logger(log);

        if let Some(allow_signup) = self.allow_signup {
            builder = builder.with_allow_signup(allow_signup);
        }
        if let Some(base_url) = &self.base_url {
            builder = builder.with_base_url(base_url)?;
        }

        builder.build()
    }
}
