use crate::options::MiddlewareOptions;
use oauth_app::OAuthApp;
use std::sync::Arc;

/// Shared, read-only state of the router. Cloned per request.
#[derive(Clone)]
pub struct RouterState {
    pub app: Arc<dyn OAuthApp>,
    pub options: Arc<MiddlewareOptions>,
}

impl RouterState {
    pub fn new(app: Arc<dyn OAuthApp>, options: MiddlewareOptions) -> Self {
        Self {
            app,
            options: Arc::new(options),
        }
    }
}
