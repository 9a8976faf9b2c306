use std::collections::HashMap;

use axum::body::{to_bytes, Body};
use http::header::AUTHORIZATION;
use http::{HeaderMap, Request};
use oauth_app::{CreateTokenOptions, RefreshTokenOptions, ScopeTokenOptions, TokenOptions};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::api::routes::Operation;
use crate::errors::RouterError;

/// Largest request body read for an OAuth route
pub const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Schemes stripped from the `authorization` header, compared case-insensitively
const AUTHORIZATION_SCHEMES: &[&str] = &["token ", "bearer "];

/// Validated inputs of a matched operation
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    Login {
        state: Option<String>,
        scopes: Option<String>,
        redirect_url: Option<String>,
        allow_signup: Option<bool>,
    },
    /// The provider redirected back with an error instead of a code
    CallbackError {
        error: String,
        description: Option<String>,
    },
    Callback(CreateTokenOptions),
    CreateToken(CreateTokenOptions),
    CheckToken(TokenOptions),
    ResetToken(TokenOptions),
    ScopeToken(ScopeTokenOptions),
    RefreshToken(RefreshTokenOptions),
    DeleteToken(TokenOptions),
    DeleteAuthorization(TokenOptions),
}

/// Body fields of a scoped token request. A `token` field in the body is
/// ignored, the token always comes from the header.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScopeTokenBody {
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    target_id: Option<u64>,
    #[serde(default)]
    repositories: Option<Vec<String>>,
    #[serde(default)]
    permissions: Option<Map<String, Value>>,
}

/// Pulls the inputs of `operation` out of the request.
///
/// The header is checked before the body is read, so requests missing it
/// fail without their body being consumed.
pub async fn extract(operation: Operation, request: Request<Body>) -> Result<Params, RouterError> {
    let (parts, body) = request.into_parts();
    let query = parse_query(parts.uri.query());

    match operation {
        Operation::Login => Ok(Params::Login {
            state: non_empty(&query, "state"),
            scopes: non_empty(&query, "scopes"),
            redirect_url: non_empty(&query, "redirectUrl"),
            allow_signup: non_empty(&query, "allowSignup").map(|value| value == "true"),
        }),
        Operation::Callback => {
            if let Some(error) = non_empty(&query, "error") {
                return Ok(Params::CallbackError {
                    error,
                    description: non_empty(&query, "error_description"),
                });
            }
            let (Some(code), Some(state)) = (non_empty(&query, "code"), non_empty(&query, "state"))
            else {
                return Err(RouterError::MissingCodeOrState);
            };
            Ok(Params::Callback(CreateTokenOptions {
                state,
                code,
                redirect_url: None,
            }))
        }
        Operation::CreateToken => {
            let body = read_json(body).await?;
            let field = |name: &str| {
                body.get(name)
                    .and_then(Value::as_str)
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
            };
            let (Some(code), Some(state)) = (field("code"), field("state")) else {
                return Err(RouterError::MissingCodeOrState);
            };
            Ok(Params::CreateToken(CreateTokenOptions {
                state,
                code,
                redirect_url: field("redirectUrl"),
            }))
        }
        Operation::CheckToken => Ok(Params::CheckToken(token_options(&parts.headers)?)),
        Operation::ResetToken => Ok(Params::ResetToken(token_options(&parts.headers)?)),
        Operation::DeleteToken => Ok(Params::DeleteToken(token_options(&parts.headers)?)),
        Operation::DeleteAuthorization => Ok(Params::DeleteAuthorization(token_options(
            &parts.headers,
        )?)),
        Operation::ScopeToken => {
            let TokenOptions { token } = token_options(&parts.headers)?;
            let body = read_json(body).await?;
            let body: ScopeTokenBody =
                serde_json::from_value(body).map_err(|_| RouterError::MalformedBody)?;
            Ok(Params::ScopeToken(ScopeTokenOptions {
                token,
                target: body.target,
                target_id: body.target_id,
                repositories: body.repositories,
                permissions: body.permissions,
            }))
        }
        Operation::RefreshToken => {
            // Required, though only the refresh token is passed on
            token_options(&parts.headers)?;
            let body = read_json(body).await?;
            let refresh_token = body
                .get("refreshToken")
                .and_then(Value::as_str)
                .filter(|value| !value.is_empty())
                .ok_or(RouterError::MissingRefreshToken)?;
            Ok(Params::RefreshToken(RefreshTokenOptions {
                refresh_token: refresh_token.to_string(),
            }))
        }
    }
}

/// Decodes a query string. The first occurrence of a repeated key wins.
fn parse_query(query: Option<&str>) -> HashMap<String, String> {
    let mut params = HashMap::new();
    if let Some(query) = query {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params
                .entry(key.into_owned())
                .or_insert_with(|| value.into_owned());
        }
    }
    params
}

fn non_empty(query: &HashMap<String, String>, name: &str) -> Option<String> {
    query.get(name).filter(|value| !value.is_empty()).cloned()
}

/// Extracts the bare token from an `authorization: token <value>` header.
/// A header without a known scheme or without a value counts as missing.
pub fn authorization_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = AUTHORIZATION_SCHEMES.iter().find_map(|scheme| {
        value
            .get(..scheme.len())
            .filter(|prefix| prefix.eq_ignore_ascii_case(scheme))
            .map(|_| value[scheme.len()..].trim())
    })?;

    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

fn token_options(headers: &HeaderMap) -> Result<TokenOptions, RouterError> {
    authorization_token(headers)
        .map(|token| TokenOptions { token })
        .ok_or(RouterError::MissingAuthorization)
}

/// Reads the whole body as JSON. An empty body reads as `{}`.
async fn read_json(body: Body) -> Result<Value, RouterError> {
    let bytes = to_bytes(body, MAX_BODY_SIZE)
        .await
        .map_err(|_| RouterError::MalformedBody)?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(&bytes).map_err(|_| RouterError::MalformedBody)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(uri: &str, authorization: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = authorization {
            builder = builder.header("authorization", value);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[test]
    fn test_authorization_token() {
        let headers = |value: &str| {
            let mut headers = HeaderMap::new();
            headers.insert(AUTHORIZATION, value.parse().unwrap());
            headers
        };

        assert_eq!(authorization_token(&headers("token abc")), Some("abc".to_string()));
        assert_eq!(authorization_token(&headers("Token abc")), Some("abc".to_string()));
        assert_eq!(authorization_token(&headers("bearer abc")), Some("abc".to_string()));
        assert_eq!(authorization_token(&headers("abc")), None);
        assert_eq!(authorization_token(&headers("Basic Zm9vOmJhcg==")), None);
        assert_eq!(authorization_token(&headers("token ")), None);
        assert_eq!(authorization_token(&headers("token")), None);
        assert_eq!(authorization_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_parse_query() {
        let query = parse_query(Some("state=a%20b&scopes=repo,gist&state=c"));
        assert_eq!(query.get("state").map(String::as_str), Some("a b"));
        assert_eq!(query.get("scopes").map(String::as_str), Some("repo,gist"));
        assert!(parse_query(None).is_empty());
    }

    #[tokio::test]
    async fn test_login_params() {
        let params = extract(
            Operation::Login,
            request("/login?state=s&allowSignup=false&redirectUrl=http://localhost", None, ""),
        )
        .await
        .unwrap();
        assert_eq!(
            params,
            Params::Login {
                state: Some("s".to_string()),
                scopes: None,
                redirect_url: Some("http://localhost".to_string()),
                allow_signup: Some(false),
            }
        );
    }

    #[tokio::test]
    async fn test_callback_error_wins_over_code() {
        let params = extract(
            Operation::Callback,
            request("/callback?error=E&code=c&state=s", None, ""),
        )
        .await
        .unwrap();
        assert_eq!(
            params,
            Params::CallbackError {
                error: "E".to_string(),
                description: None
            }
        );
    }

    #[tokio::test]
    async fn test_callback_requires_code_and_state() {
        let result = extract(Operation::Callback, request("/callback?code=c", None, "")).await;
        assert!(matches!(result, Err(RouterError::MissingCodeOrState)));
    }

    #[tokio::test]
    async fn test_create_token_body() {
        let result = extract(Operation::CreateToken, request("/token", None, "{")).await;
        assert!(matches!(result, Err(RouterError::MalformedBody)));

        let result = extract(Operation::CreateToken, request("/token", None, "")).await;
        assert!(matches!(result, Err(RouterError::MissingCodeOrState)));

        let result = extract(Operation::CreateToken, request("/token", None, "[1]")).await;
        assert!(matches!(result, Err(RouterError::MissingCodeOrState)));

        let params = extract(
            Operation::CreateToken,
            request("/token", None, r#"{"code":"c","state":"s","other":1}"#),
        )
        .await
        .unwrap();
        assert_eq!(
            params,
            Params::CreateToken(CreateTokenOptions {
                state: "s".to_string(),
                code: "c".to_string(),
                redirect_url: None,
            })
        );
    }

    #[tokio::test]
    async fn test_header_checked_before_body() {
        // The body is invalid JSON, the missing header must still be reported.
        let result = extract(Operation::ScopeToken, request("/token/scoped", None, "{")).await;
        assert!(matches!(result, Err(RouterError::MissingAuthorization)));

        let result = extract(Operation::RefreshToken, request("/refresh-token", None, "{")).await;
        assert!(matches!(result, Err(RouterError::MissingAuthorization)));
    }

    #[tokio::test]
    async fn test_scope_token_body() {
        let body = json!({
            "token": "ignored",
            "target": "octokit",
            "targetId": 1,
            "repositories": ["oauth-methods.js"],
            "permissions": {"issues": "write"}
        });
        let params = extract(
            Operation::ScopeToken,
            request("/token/scoped", Some("token token123"), &body.to_string()),
        )
        .await
        .unwrap();

        let Params::ScopeToken(options) = params else {
            panic!("expected scope token params");
        };
        assert_eq!(options.token, "token123");
        assert_eq!(options.target.as_deref(), Some("octokit"));
        assert_eq!(options.target_id, Some(1));
        assert_eq!(options.repositories, Some(vec!["oauth-methods.js".to_string()]));
        assert_eq!(options.permissions.unwrap()["issues"], "write");

        let result = extract(
            Operation::ScopeToken,
            request("/token/scoped", Some("token token123"), r#"{"targetId":"one"}"#),
        )
        .await;
        assert!(matches!(result, Err(RouterError::MalformedBody)));
    }

    #[tokio::test]
    async fn test_refresh_token_body() {
        let result = extract(
            Operation::RefreshToken,
            request("/refresh-token", Some("token token123"), "{}"),
        )
        .await;
        assert!(matches!(result, Err(RouterError::MissingRefreshToken)));

        let params = extract(
            Operation::RefreshToken,
            request("/refresh-token", Some("token token123"), r#"{"refreshToken":"r1"}"#),
        )
        .await
        .unwrap();
        assert_eq!(
            params,
            Params::RefreshToken(RefreshTokenOptions {
                refresh_token: "r1".to_string()
            })
        );
    }
}
