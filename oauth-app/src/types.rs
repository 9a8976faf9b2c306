use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use url::Url;

pub type Scope = String;

const GITHUB_WEB_URL: &str = "https://github.com";
const GITHUB_API_URL: &str = "https://api.github.com";
const ENTERPRISE_API_SUFFIX: &str = "/api/v3";

/// Kind of GitHub client the credentials belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ClientType {
    #[default]
    #[serde(rename = "oauth-app")]
    OAuthApp,
    #[serde(rename = "github-app")]
    GitHubApp,
}

impl ClientType {
    pub fn as_str(self) -> &'static str {
        match self {
            ClientType::OAuthApp => "oauth-app",
            ClientType::GitHubApp => "github-app",
        }
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClientType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "oauth-app" => Ok(ClientType::OAuthApp),
            "github-app" => Ok(ClientType::GitHubApp),
            other => Err(format!(
                "unknown client type '{other}', expected 'oauth-app' or 'github-app'"
            )),
        }
    }
}

// Parsed from a plain string so any config source (env, TOML, defaults) works
impl<'de> Deserialize<'de> for ClientType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// Static settings of an OAuth app that request handlers need without
/// calling out to the identity provider (e.g. to build the login redirect).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppSettings {
    pub client_type: ClientType,
    pub client_id: String,
    /// Scopes requested on login when the caller doesn't pass any.
    /// Only meaningful for OAuth apps, GitHub apps have fixed permissions.
    pub default_scopes: Vec<Scope>,
    pub allow_signup: Option<bool>,
    /// REST API root for GitHub Enterprise Server, e.g. `https://ghe.example.com/api/v3`
    pub base_url: Option<Url>,
}

impl AppSettings {
    pub fn new(client_type: ClientType, client_id: impl Into<String>) -> Self {
        Self {
            client_type,
            client_id: client_id.into(),
            ..Default::default()
        }
    }

    /// REST API root without trailing slash
    pub fn api_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.as_str().trim_end_matches('/').to_string(),
            None => GITHUB_API_URL.to_string(),
        }
    }

    /// Web root (where `/login/oauth/*` lives) without trailing slash
    pub fn web_url(&self) -> String {
        match &self.base_url {
            Some(url) => {
                let api = url.as_str().trim_end_matches('/');
                api.strip_suffix(ENTERPRISE_API_SUFFIX)
                    .unwrap_or(api)
                    .to_string()
            }
            None => GITHUB_WEB_URL.to_string(),
        }
    }

    /// Scopes to request on login when none were passed, `None` if nothing
    /// should be requested.
    pub fn login_scopes(&self) -> Option<String> {
        if self.client_type == ClientType::GitHubApp || self.default_scopes.is_empty() {
            return None;
        }
        Some(self.default_scopes.join(","))
    }
}

/// Arguments for exchanging an authorization code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTokenOptions {
    pub state: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

/// Arguments for operations acting on an existing user token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenOptions {
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenOptions {
    pub refresh_token: String,
}

/// Arguments for creating a token limited to a target and/or repositories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeTokenOptions {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repositories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Map<String, Value>>,
}

/// User authentication produced by a token exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authentication {
    pub client_type: ClientType,
    pub client_id: String,
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<Scope>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token_expires_at: Option<String>,
}

impl Authentication {
    pub fn new(settings: &AppSettings, token: impl Into<String>) -> Self {
        Self {
            client_type: settings.client_type,
            client_id: settings.client_id.clone(),
            token: token.into(),
            scopes: None,
            refresh_token: None,
            expires_at: None,
            refresh_token_expires_at: None,
        }
    }

    pub fn with_scopes(mut self, scopes: Vec<Scope>) -> Self {
        self.scopes = Some(scopes);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedToken {
    pub authentication: Authentication,
}
