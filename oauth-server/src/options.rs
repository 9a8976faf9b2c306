use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::response::Response;
use http::Request;
use oauth_app::{LogFacade, Logger};

pub const DEFAULT_PATH_PREFIX: &str = "/api/github/oauth";

/// Receives every request that doesn't match an OAuth route.
///
/// The request is handed over exactly as it arrived: its body has not been
/// read, so the handler can still consume it.
#[async_trait]
pub trait UnhandledRequest: Send + Sync {
    async fn handle(&self, request: Request<Body>) -> Response;
}

#[async_trait]
impl<F, Fut> UnhandledRequest for F
where
    F: Fn(Request<Body>) -> Fut + Send + Sync,
    Fut: Future<Output = Response> + Send + 'static,
{
    async fn handle(&self, request: Request<Body>) -> Response {
        self(request).await
    }
}

/// Options of the OAuth request router
#[derive(Clone)]
pub struct MiddlewareOptions {
    /// Prefix all routes live under, without trailing slash
    pub path_prefix: String,
    pub log: Arc<dyn Logger>,
    /// Handler for unmatched requests; `None` answers them with 404
    pub on_unhandled_request: Option<Arc<dyn UnhandledRequest>>,
}

impl Default for MiddlewareOptions {
    fn default() -> Self {
        Self {
            path_prefix: DEFAULT_PATH_PREFIX.to_string(),
            log: Arc::new(LogFacade),
            on_unhandled_request: None,
        }
    }
}

impl MiddlewareOptions {
    pub fn with_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.path_prefix = prefix.trim_end_matches('/').to_string();
        self
    }

    pub fn with_logger(mut self, log: Arc<dyn Logger>) -> Self {
        self.log = log;
        self
    }

    pub fn on_unhandled_request<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.on_unhandled_request = Some(Arc::new(handler));
        self
    }
}
