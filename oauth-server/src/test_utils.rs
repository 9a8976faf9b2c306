use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::Router;
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use log::LevelFilter;
use oauth_app::{
    AppError, AppSettings, ClientType, CreateTokenOptions, CreatedToken, OAuthApp,
    RefreshTokenOptions, ScopeTokenOptions, TokenOptions,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tower::ServiceExt;

use crate::options::MiddlewareOptions;
use crate::{create_router, create_service_router};

/// `OAuthApp` double that records every call and answers with canned results.
///
/// Results are configured per operation (by the trait method name) with
/// [`MockApp::respond`] or [`MockApp::reject`]. Unconfigured operations fail.
pub struct MockApp {
    settings: AppSettings,
    results: HashMap<&'static str, Result<Value, AppError>>,
    calls: Mutex<Vec<(&'static str, Value)>>,
}

impl MockApp {
    pub fn new() -> Self {
        Self::with_settings(AppSettings::new(ClientType::OAuthApp, "0123"))
    }

    pub fn with_settings(settings: AppSettings) -> Self {
        Self {
            settings,
            results: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(mut self, operation: &'static str, result: Value) -> Self {
        self.results.insert(operation, Ok(result));
        self
    }

    pub fn reject(mut self, operation: &'static str, error: AppError) -> Self {
        self.results.insert(operation, Err(error));
        self
    }

    /// Calls received so far with their serialized options
    pub fn calls(&self) -> Vec<(&'static str, Value)> {
        self.calls.lock().unwrap().clone()
    }

    fn call<O: Serialize, T: DeserializeOwned>(
        &self,
        operation: &'static str,
        options: &O,
    ) -> Result<T, AppError> {
        self.calls
            .lock()
            .unwrap()
            .push((operation, serde_json::to_value(options).unwrap()));

        match self.results.get(operation) {
            Some(Ok(value)) => Ok(serde_json::from_value(value.clone()).unwrap()),
            Some(Err(e)) => Err(clone_error(e)),
            None => Err(AppError::Rejected(format!("{operation} is not mocked"))),
        }
    }
}

// AppError carries a url::ParseError, so it isn't Clone
fn clone_error(e: &AppError) -> AppError {
    match e {
        AppError::Response { status, message } => AppError::Response {
            status: *status,
            message: message.clone(),
        },
        other => AppError::Rejected(other.to_string()),
    }
}

#[async_trait]
impl OAuthApp for MockApp {
    fn settings(&self) -> &AppSettings {
        &self.settings
    }

    async fn create_token(&self, options: CreateTokenOptions) -> Result<CreatedToken, AppError> {
        self.call("create_token", &options)
    }

    async fn check_token(&self, options: TokenOptions) -> Result<Value, AppError> {
        self.call("check_token", &options)
    }

    async fn reset_token(&self, options: TokenOptions) -> Result<Value, AppError> {
        self.call("reset_token", &options)
    }

    async fn refresh_token(&self, options: RefreshTokenOptions) -> Result<Value, AppError> {
        self.call("refresh_token", &options)
    }

    async fn scope_token(&self, options: ScopeTokenOptions) -> Result<Value, AppError> {
        self.call("scope_token", &options)
    }

    async fn delete_token(&self, options: TokenOptions) -> Result<(), AppError> {
        self.call::<_, Value>("delete_token", &options).map(|_| ())
    }

    async fn delete_authorization(&self, options: TokenOptions) -> Result<(), AppError> {
        self.call::<_, Value>("delete_authorization", &options)
            .map(|_| ())
    }
}

/// Router wired to a [`MockApp`], driven in-process with `oneshot`.
pub struct TestFixture {
    pub app: Router,
    pub mock: Arc<MockApp>,
}

impl TestFixture {
    pub fn new(mock: MockApp) -> Self {
        Self::with_options(mock, MiddlewareOptions::default())
    }

    pub fn with_options(mock: MockApp, options: MiddlewareOptions) -> Self {
        Self::setup_logger(LevelFilter::Debug);

        let mock = Arc::new(mock);
        let app = create_router(mock.clone(), options);
        Self { app, mock }
    }

    /// Same as [`TestFixture::with_options`], with the binary's `/health` route
    pub fn service(mock: MockApp, options: MiddlewareOptions) -> Self {
        Self::setup_logger(LevelFilter::Debug);

        let mock = Arc::new(mock);
        let app = create_service_router(mock.clone(), options);
        Self { app, mock }
    }

    pub fn setup_logger(level: LevelFilter) {
        let _ = env_logger::builder()
            .filter_level(level)
            .is_test(true)
            .try_init();
    }

    pub fn request_builder(&self, method: Method, uri: impl AsRef<str>) -> http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri.as_ref())
            .header("Content-Type", "application/json")
    }

    pub async fn get(&self, uri: impl AsRef<str>) -> TestResponse {
        let request = self
            .request_builder(Method::GET, uri)
            .body(Body::empty())
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends `body` as JSON, or no body at all when it is `null`
    pub async fn send_json(
        &self,
        method: Method,
        uri: impl AsRef<str>,
        authorization: Option<&str>,
        body: Value,
    ) -> TestResponse {
        let mut builder = self.request_builder(method, uri);
        if let Some(authorization) = authorization {
            builder = builder.header("Authorization", authorization);
        }

        let body = if body.is_null() {
            Body::empty()
        } else {
            Body::from(serde_json::to_vec(&body).expect("Failed to serialize body to JSON"))
        };

        self.send(builder.body(body).expect("Failed to build request"))
            .await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        // Non-JSON bodies (empty, HTML, plain text) read as {}
        let json = if !body.is_empty() {
            serde_json::from_slice(&body).unwrap_or_else(|_| serde_json::json!({}))
        } else {
            serde_json::json!({})
        };

        TestResponse {
            status,
            headers,
            body,
            json,
        }
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub json: Value,
}

impl TestResponse {
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {} but got {} with body: {}",
            expected,
            self.status,
            self.text()
        );
        self
    }

    pub fn header(&self, name: &str) -> &str {
        self.headers
            .get(name)
            .unwrap_or_else(|| panic!("Missing header {name}"))
            .to_str()
            .expect("Header is not valid UTF-8")
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}
