//! # oauth-app
//!
//! The OAuth application contract used by the request router, and a GitHub
//! implementation of it.
//!
//! ## Components
//!
//! - **OAuthApp:** One async operation per OAuth flow step (code exchange,
//!   token check/reset/refresh/scoping/deletion, grant revocation).
//! - **GitHubApp:** `OAuthApp` backed by GitHub's web flow and REST API.
//! - **Events:** Closed set of notifications emitted after successful operations.

pub mod builder;
pub mod error;
pub mod events;
pub mod github;
pub mod logger;
pub mod types;

use async_trait::async_trait;
use serde_json::Value;

pub use crate::builder::GitHubAppBuilder;
pub use crate::error::AppError;
pub use crate::events::{ActionName, Event, EventContext, EventHandler, EventName};
pub use crate::github::GitHubApp;
pub use crate::logger::{LogFacade, Logger, NoopLogger};
pub use crate::types::{
    AppSettings, Authentication, ClientType, CreateTokenOptions, CreatedToken,
    RefreshTokenOptions, Scope, ScopeTokenOptions, TokenOptions,
};

/// Operations an OAuth app exposes to the request router.
///
/// Implementations are shared across concurrent requests and must be safe to
/// call concurrently. Results of the inspection operations are returned as
/// JSON and passed through to HTTP clients unchanged.
#[async_trait]
pub trait OAuthApp: Send + Sync {
    /// Static settings used to build the login redirect
    fn settings(&self) -> &AppSettings;

    /// Exchanges an authorization code for a user token
    async fn create_token(&self, options: CreateTokenOptions) -> Result<CreatedToken, AppError>;

    /// Checks a token and returns what the provider knows about it
    async fn check_token(&self, options: TokenOptions) -> Result<Value, AppError>;

    /// Invalidates a token and issues a replacement
    async fn reset_token(&self, options: TokenOptions) -> Result<Value, AppError>;

    /// Exchanges a refresh token for a new user token
    async fn refresh_token(&self, options: RefreshTokenOptions) -> Result<Value, AppError>;

    /// Creates a token limited to a target account, repositories and permissions
    async fn scope_token(&self, options: ScopeTokenOptions) -> Result<Value, AppError>;

    /// Revokes a single token
    async fn delete_token(&self, options: TokenOptions) -> Result<(), AppError>;

    /// Revokes the whole grant, invalidating every token of the user
    async fn delete_authorization(&self, options: TokenOptions) -> Result<(), AppError>;
}
