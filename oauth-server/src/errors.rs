use axum::response::IntoResponse;
use axum::Json;
use http::StatusCode;
use oauth_app::AppError;
use serde_json::json;
use thiserror::Error;

/// Message used when a failure carries no message of its own
pub const GENERIC_ERROR_MESSAGE: &str = "request error";

/// Failure of a routed request. Every variant is answered with
/// `400 {"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("Both \"code\" & \"state\" parameters are required")]
    MissingCodeOrState,

    #[error("\"Authorization\" header is required")]
    MissingAuthorization,

    #[error("refreshToken must be sent in request body")]
    MissingRefreshToken,

    /// Body could not be read or is not the JSON the operation expects
    #[error("{}", GENERIC_ERROR_MESSAGE)]
    MalformedBody,

    /// The OAuth app rejected the operation
    #[error("{0}")]
    Provider(#[from] AppError),
}

impl RouterError {
    /// Message placed in the `error` field of the response body
    pub fn message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            GENERIC_ERROR_MESSAGE.to_string()
        } else {
            message
        }
    }
}

impl From<url::ParseError> for RouterError {
    fn from(e: url::ParseError) -> Self {
        RouterError::Provider(AppError::UrlParse(e))
    }
}

impl IntoResponse for RouterError {
    fn into_response(self) -> axum::response::Response {
        let body = json!({
            "error": self.message(),
        });
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}
