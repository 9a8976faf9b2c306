use std::error::Error as StdError;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::response::{IntoResponse, Response};
use http::header::{HeaderName, HOST};
use http::{Request, StatusCode};

use crate::state::RouterState;

/// Hands a request no route matched to the configured handler, untouched.
/// Without a handler the answer is an empty 404.
pub async fn unhandled(state: &RouterState, request: Request<Body>) -> Response {
    match &state.options.on_unhandled_request {
        Some(handler) => {
            state.options.log.debug(&format!(
                "No OAuth route for {} {}, handing over",
                request.method(),
                request.uri().path()
            ));
            handler.handle(request).await
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Relays unmatched requests to another HTTP service, e.g. the application
/// the OAuth routes are mounted in front of.
#[derive(Debug, Clone)]
pub struct ForwardToUpstream {
    client: reqwest::Client,
    upstream: String,
}

impl ForwardToUpstream {
    pub fn new(upstream: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            upstream: upstream.into().trim_end_matches('/').to_string(),
        })
    }

    pub async fn forward(&self, request: Request<Body>) -> Response {
        let path = request
            .uri()
            .path_and_query()
            .map(|path| path.to_string())
            .unwrap_or_default();
        let url = format!("{}{}", self.upstream, path);

        let method = match reqwest::Method::from_bytes(request.method().as_str().as_bytes()) {
            Ok(method) => method,
            Err(_) => return StatusCode::BAD_REQUEST.into_response(),
        };
        log::debug!("Forwarding unhandled request: {} {}", method, url);

        let mut builder = self.client.request(method, &url);
        for (key, value) in request.headers() {
            // reqwest sets the host of the upstream itself
            if key == HOST {
                continue;
            }
            builder = builder.header(key.as_str(), value.as_bytes());
        }

        let body = match to_bytes(request.into_body(), usize::MAX).await {
            Ok(bytes) => bytes,
            Err(_) => {
                return (StatusCode::BAD_GATEWAY, "Failed to read request body").into_response()
            }
        };
        if !body.is_empty() {
            builder = builder.body(body);
        }

        match builder.send().await {
            Ok(upstream_response) => {
                let status = upstream_response.status();
                let headers = upstream_response.headers().clone();
                let bytes = match upstream_response.bytes().await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        log::error!("Failed to read upstream response body: {}", e);
                        return (StatusCode::BAD_GATEWAY, "Failed to read response body")
                            .into_response();
                    }
                };

                let mut response = Response::new(Body::from(bytes));
                *response.status_mut() =
                    StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
                for (key, value) in headers.iter() {
                    if let Ok(name) = HeaderName::from_bytes(key.as_str().as_bytes()) {
                        response.headers_mut().append(name, value.clone());
                    }
                }
                response
            }
            Err(e) => {
                log::error!(
                    "Failed to forward request to {}: {} (source: {:?})",
                    url,
                    e,
                    e.source()
                );
                let message = if e.is_timeout() {
                    "Request timed out while connecting to upstream"
                } else if e.is_connect() {
                    "Connection error occurred while connecting to upstream"
                } else {
                    "Failed to forward request to upstream"
                };
                (StatusCode::BAD_GATEWAY, message).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use http_body_util::BodyExt;
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8_lossy(&bytes).to_string()
    }

    #[tokio::test]
    async fn test_forward_with_body_and_headers() {
        let upstream = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/unrelated"))
            .and(matchers::query_param("a", "1"))
            .and(matchers::header("x-custom", "value"))
            .respond_with(|req: &wiremock::Request| {
                ResponseTemplate::new(200)
                    .set_body_bytes(req.body.clone())
                    .insert_header("x-response", "test")
            })
            .expect(1)
            .mount(&upstream)
            .await;

        let forwarder = ForwardToUpstream::new(upstream.uri(), Duration::from_secs(5)).unwrap();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/unrelated?a=1")
            .header("x-custom", "value")
            .body(Body::from("unrelated body"))
            .unwrap();

        let response = forwarder.forward(request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-response"], "test");
        assert_eq!(body_text(response).await, "unrelated body");

        upstream.verify().await;
    }

    #[tokio::test]
    async fn test_forward_keeps_upstream_status() {
        let upstream = MockServer::start().await;
        Mock::given(matchers::any())
            .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
            .mount(&upstream)
            .await;

        let forwarder = ForwardToUpstream::new(format!("{}/", upstream.uri()), Duration::from_secs(5))
            .unwrap();
        let request = Request::builder()
            .uri("/anything")
            .body(Body::empty())
            .unwrap();

        let response = forwarder.forward(request).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_text(response).await, "Service Unavailable");
    }

    #[tokio::test]
    async fn test_forward_connection_error() {
        // Port 1 is reserved and nothing listens on it
        let forwarder =
            ForwardToUpstream::new("http://127.0.0.1:1", Duration::from_secs(1)).unwrap();
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();

        let response = forwarder.forward(request).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(body_text(response).await.contains("Connection"));
    }
}
