use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use http::header::LOCATION;
use http::StatusCode;
use oauth_app::{AppSettings, CreatedToken};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::{json, Value};
use url::Url;

/// Length of the generated login `state`
const STATE_LENGTH: usize = 20;

/// Successful result of a routed operation
#[derive(Debug)]
pub enum Outcome {
    /// Send the browser to the provider's authorize page
    Redirect(Url),
    /// Token exchanged through the browser callback
    TokenPage(String),
    /// Token exchanged through the API
    Created(CreatedToken),
    /// App result passed through as is
    Json(Value),
    NoContent,
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        match self {
            Outcome::Redirect(url) => {
                (StatusCode::FOUND, [(LOCATION, url.to_string())]).into_response()
            }
            Outcome::TokenPage(token) => Html(format!(
                "<h1>Token created successfully</h1>\n\n<p>Your token is: <strong>{token}</strong>. Copy it now as it cannot be shown again.</p>"
            ))
            .into_response(),
            Outcome::Created(created) => {
                let authentication = created.authentication;
                let mut body = json!({ "token": authentication.token });
                if let Some(scopes) = authentication.scopes {
                    body["scopes"] = json!(scopes);
                }
                (StatusCode::CREATED, Json(body)).into_response()
            }
            Outcome::Json(value) => (StatusCode::OK, Json(value)).into_response(),
            Outcome::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// Random value matching `^\w+$`, used when the caller passes no `state`
pub fn random_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LENGTH)
        .map(char::from)
        .collect()
}

/// Builds the provider's authorize URL for the login redirect
pub fn authorization_url(
    settings: &AppSettings,
    state: &str,
    scopes: Option<&str>,
    redirect_url: Option<&str>,
    allow_signup: Option<bool>,
) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(&format!("{}/login/oauth/authorize", settings.web_url()))?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("client_id", &settings.client_id);
        query.append_pair("state", state);
        if let Some(scopes) = scopes {
            query.append_pair("scope", scopes);
        }
        if let Some(redirect_url) = redirect_url {
            query.append_pair("redirect_uri", redirect_url);
        }
        if let Some(allow_signup) = allow_signup {
            query.append_pair("allow_signup", if allow_signup { "true" } else { "false" });
        }
    }
    Ok(url)
}
