//! # oauth-server
//!
//! HTTP routes for the GitHub OAuth web flow, backed by an [`OAuthApp`].
//!
//! | Method | Path                     | Operation           |
//! |--------|--------------------------|---------------------|
//! | GET    | `{prefix}/login`         | redirect to GitHub  |
//! | GET    | `{prefix}/callback`      | code exchange       |
//! | POST   | `{prefix}/token`         | code exchange       |
//! | GET    | `{prefix}/token`         | check token         |
//! | PATCH  | `{prefix}/token`         | reset token         |
//! | POST   | `{prefix}/token/scoped`  | scope token         |
//! | PATCH  | `{prefix}/refresh-token` | refresh token       |
//! | DELETE | `{prefix}/token`         | delete token        |
//! | DELETE | `{prefix}/grant`         | delete authorization |
//!
//! Any other request goes to the unhandled request handler of
//! [`MiddlewareOptions`], or is answered with an empty 404.

pub mod api;
pub mod config;
pub mod errors;
pub mod options;
pub mod state;
#[cfg(test)]
mod test_utils;

use std::sync::Arc;

use axum::Router;
use oauth_app::OAuthApp;

pub use crate::api::fallback::ForwardToUpstream;
pub use crate::errors::RouterError;
pub use crate::options::{MiddlewareOptions, UnhandledRequest, DEFAULT_PATH_PREFIX};
pub use crate::state::RouterState;

/// Creates the OAuth router for `app`
pub fn create_router(app: Arc<dyn OAuthApp>, options: MiddlewareOptions) -> Router {
    api::router().with_state(RouterState::new(app, options))
}

/// Creates the OAuth router for `app` together with `GET /health`
pub fn create_service_router(app: Arc<dyn OAuthApp>, options: MiddlewareOptions) -> Router {
    api::service_router().with_state(RouterState::new(app, options))
}
