mod dispatch;
mod extract;
pub mod fallback;
pub mod health;
mod respond;
pub mod routes;

use axum::body::Body;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Router;
use http::Request;

use crate::api::dispatch::dispatch;
use crate::api::extract::extract;
use crate::api::routes::match_route;
use crate::state::RouterState;

/// Router answering every request. Matching is done by [`match_route`] rather
/// than axum's router, so a known path with the wrong method reaches the
/// unhandled request handler instead of producing a 405.
pub(crate) fn router() -> Router<RouterState> {
    Router::new().fallback(handle_request)
}

/// [`router`] plus `GET /health`. Other methods on `/health` go through the
/// same unhandled request path as any unmatched request.
pub(crate) fn service_router() -> Router<RouterState> {
    Router::new()
        .merge(health::router())
        .fallback(handle_request)
        .method_not_allowed_fallback(handle_request)
}

async fn handle_request(State(state): State<RouterState>, request: Request<Body>) -> Response {
    let Some(operation) = match_route(
        &state.options.path_prefix,
        request.method().as_str(),
        request.uri().path(),
    ) else {
        return fallback::unhandled(&state, request).await;
    };

    let log = &state.options.log;
    log.debug(&format!(
        "{} {} -> {}",
        request.method(),
        request.uri().path(),
        operation.as_str()
    ));

    let result = match extract(operation, request).await {
        Ok(params) => dispatch(state.app.as_ref(), params).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(outcome) => outcome.into_response(),
        Err(e) => {
            log.warn(&format!("{} failed: {}", operation.as_str(), e.message()));
            e.into_response()
        }
    }
}
