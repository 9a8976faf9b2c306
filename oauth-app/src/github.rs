use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::OAuthApp;
use crate::error::AppError;
use crate::events::{Event, EventHandlers};
use crate::logger::Logger;
use crate::types::{
    AppSettings, Authentication, ClientType, CreateTokenOptions, CreatedToken,
    RefreshTokenOptions, ScopeTokenOptions, TokenOptions,
};

const GITHUB_JSON: &str = "application/vnd.github+json";

/// [`OAuthApp`] talking to GitHub (or GitHub Enterprise Server).
///
/// Code and refresh-token exchanges go through the web flow endpoint
/// `/login/oauth/access_token`; everything else uses the REST API
/// `/applications/{client_id}/...` endpoints with basic authentication.
pub struct GitHubApp {
    pub(crate) settings: AppSettings,
    pub(crate) client_secret: String,
    pub(crate) client: Client,
    pub(crate) log: Arc<dyn Logger>,
    pub(crate) handlers: EventHandlers,
}

#[derive(Debug, Serialize)]
struct AccessTokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_uri: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    grant_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<&'a str>,
}

/// Body of `/login/oauth/access_token`. GitHub reports failures with a 200
/// status and the `error*` fields set.
#[derive(Debug, Default, Deserialize)]
struct AccessTokenResponse {
    access_token: Option<String>,
    scope: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    refresh_token_expires_in: Option<i64>,
    error: Option<String>,
    error_description: Option<String>,
    error_uri: Option<String>,
}

impl GitHubApp {
    fn application_url(&self, path: &str) -> String {
        format!(
            "{}/applications/{}/{}",
            self.settings.api_url(),
            self.settings.client_id,
            path
        )
    }

    /// Sends a request to the `/applications/{client_id}` REST endpoints
    async fn send_application_request<T>(
        &self,
        method: Method,
        path: &str,
        body: &T,
    ) -> Result<Value, AppError>
    where
        T: Serialize + ?Sized,
    {
        let url = self.application_url(path);
        self.log.debug(&format!("{} {}", method, url));

        let response = self
            .client
            .request(method, &url)
            .basic_auth(&self.settings.client_id, Some(&self.client_secret))
            .header(ACCEPT, GITHUB_JSON)
            .json(body)
            .send()
            .await?;

        read_response(response).await
    }

    /// Calls the web flow token endpoint, returning the parsed body and the raw JSON
    async fn exchange(
        &self,
        request: &AccessTokenRequest<'_>,
    ) -> Result<(AccessTokenResponse, Value), AppError> {
        let url = format!("{}/login/oauth/access_token", self.settings.web_url());
        self.log.debug(&format!("POST {}", url));

        let response = self
            .client
            .post(&url)
            .header(ACCEPT, "application/json")
            .json(request)
            .send()
            .await?;

        let raw = read_response(response).await?;
        let parsed: AccessTokenResponse = serde_json::from_value(raw.clone())?;

        if let Some(error) = &parsed.error {
            return Err(AppError::Rejected(format!(
                "{} ({}, {})",
                parsed.error_description.as_deref().unwrap_or_default(),
                error,
                parsed.error_uri.as_deref().unwrap_or_default()
            )));
        }

        Ok((parsed, raw))
    }

    fn authentication_from_exchange(
        &self,
        response: &AccessTokenResponse,
    ) -> Result<Authentication, AppError> {
        let token = response.access_token.clone().ok_or_else(|| {
            AppError::Deserialization("access_token missing from response".to_string())
        })?;
        let mut authentication = Authentication::new(&self.settings, token);

        match self.settings.client_type {
            ClientType::OAuthApp => {
                let scopes = response
                    .scope
                    .as_deref()
                    .unwrap_or_default()
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
                authentication = authentication.with_scopes(scopes);
            }
            ClientType::GitHubApp => {
                let now = Utc::now();
                authentication.refresh_token = response.refresh_token.clone();
                authentication.expires_at = response
                    .expires_in
                    .map(|s| timestamp_after(now, s))
                    .transpose()?;
                authentication.refresh_token_expires_at = response
                    .refresh_token_expires_in
                    .map(|s| timestamp_after(now, s))
                    .transpose()?;
            }
        }

        Ok(authentication)
    }

    /// Authentication for a token returned by the REST endpoints
    fn authentication_from_data(&self, token: &str, data: &Value) -> Authentication {
        let authentication = Authentication::new(&self.settings, token);
        match (self.settings.client_type, data.get("scopes")) {
            (ClientType::OAuthApp, Some(Value::Array(scopes))) => authentication.with_scopes(
                scopes
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
            ),
            _ => authentication,
        }
    }

    fn require_github_app(&self, operation: &'static str) -> Result<(), AppError> {
        match self.settings.client_type {
            ClientType::GitHubApp => Ok(()),
            ClientType::OAuthApp => Err(AppError::Unsupported(operation)),
        }
    }
}

#[async_trait]
impl OAuthApp for GitHubApp {
    fn settings(&self) -> &AppSettings {
        &self.settings
    }

    async fn create_token(&self, options: CreateTokenOptions) -> Result<CreatedToken, AppError> {
        let request = AccessTokenRequest {
            client_id: &self.settings.client_id,
            client_secret: &self.client_secret,
            code: Some(&options.code),
            state: Some(&options.state),
            redirect_uri: options.redirect_url.as_deref(),
            grant_type: None,
            refresh_token: None,
        };
        let (response, _) = self.exchange(&request).await?;
        let authentication = self.authentication_from_exchange(&response)?;

        self.log.info(&format!(
            "Created token for client {}",
            self.settings.client_id
        ));
        self.handlers.emit(
            Event::TokenCreated,
            &authentication.token,
            Some(&authentication),
        );

        Ok(CreatedToken { authentication })
    }

    async fn check_token(&self, options: TokenOptions) -> Result<Value, AppError> {
        let data = self
            .send_application_request(
                Method::POST,
                "token",
                &json!({ "access_token": options.token }),
            )
            .await?;
        let authentication = self.authentication_from_data(&options.token, &data);

        Ok(json!({ "data": data, "authentication": authentication }))
    }

    async fn reset_token(&self, options: TokenOptions) -> Result<Value, AppError> {
        let data = self
            .send_application_request(
                Method::PATCH,
                "token",
                &json!({ "access_token": options.token }),
            )
            .await?;
        let token = data
            .get("token")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::Deserialization("token missing from response".to_string()))?
            .to_string();
        let authentication = self.authentication_from_data(&token, &data);

        self.handlers
            .emit(Event::TokenReset, &token, Some(&authentication));

        Ok(json!({ "data": data, "authentication": authentication }))
    }

    async fn refresh_token(&self, options: RefreshTokenOptions) -> Result<Value, AppError> {
        self.require_github_app("refreshToken")?;

        let request = AccessTokenRequest {
            client_id: &self.settings.client_id,
            client_secret: &self.client_secret,
            code: None,
            state: None,
            redirect_uri: None,
            grant_type: Some("refresh_token"),
            refresh_token: Some(&options.refresh_token),
        };
        let (response, data) = self.exchange(&request).await?;
        let authentication = self.authentication_from_exchange(&response)?;

        self.handlers.emit(
            Event::TokenRefreshed,
            &authentication.token,
            Some(&authentication),
        );

        Ok(json!({ "data": data, "authentication": authentication }))
    }

    async fn scope_token(&self, options: ScopeTokenOptions) -> Result<Value, AppError> {
        self.require_github_app("scopeToken")?;

        let mut body = json!({
            "access_token": options.token,
            "target": options.target,
            "target_id": options.target_id,
            "repositories": options.repositories,
            "permissions": options.permissions,
        });
        if let Value::Object(fields) = &mut body {
            fields.retain(|_, value| !value.is_null());
        }
        let data = self
            .send_application_request(Method::POST, "token/scoped", &body)
            .await?;
        let token = data
            .get("token")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::Deserialization("token missing from response".to_string()))?
            .to_string();
        let authentication = Authentication::new(&self.settings, &token);

        self.handlers
            .emit(Event::TokenScoped, &token, Some(&authentication));

        Ok(json!({ "data": data, "authentication": authentication }))
    }

    async fn delete_token(&self, options: TokenOptions) -> Result<(), AppError> {
        self.send_application_request(
            Method::DELETE,
            "token",
            &json!({ "access_token": options.token }),
        )
        .await?;

        self.handlers.emit(Event::TokenDeleted, &options.token, None);
        Ok(())
    }

    async fn delete_authorization(&self, options: TokenOptions) -> Result<(), AppError> {
        self.send_application_request(
            Method::DELETE,
            "grant",
            &json!({ "access_token": options.token }),
        )
        .await?;

        self.handlers.emit(Event::TokenDeleted, &options.token, None);
        self.handlers
            .emit(Event::AuthorizationDeleted, &options.token, None);
        Ok(())
    }
}

/// RFC 3339 timestamp `seconds` after `now`. Fails for lifetimes no date can hold.
fn timestamp_after(now: DateTime<Utc>, seconds: i64) -> Result<String, AppError> {
    TimeDelta::try_seconds(seconds)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true))
        .ok_or_else(|| AppError::Deserialization(format!("token lifetime {seconds}s is out of range")))
}

/// Reads a GitHub response body, turning non-2xx statuses into errors that
/// carry GitHub's `message` when it sent one.
async fn read_response(response: Response) -> Result<Value, AppError> {
    let status = response.status();
    let bytes = response.bytes().await?;
    let body = serde_json::from_slice::<Value>(&bytes).ok();

    if !status.is_success() {
        let message = body
            .as_ref()
            .and_then(|b| b.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
        return Err(AppError::Response {
            status: status.as_u16(),
            message,
        });
    }

    match body {
        Some(body) => Ok(body),
        None if bytes.is_empty() => Ok(Value::Null),
        None => Err(AppError::Deserialization(
            "response body is not valid JSON".to_string(),
        )),
    }
}
