use thiserror::Error;

/// Failure reported by an [`OAuthApp`](crate::OAuthApp) operation.
///
/// The `Display` output is the message surfaced to HTTP clients, so every
/// variant renders only its message without a kind prefix.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Rejected(String),

    #[error("{message}")]
    Response { status: u16, message: String },

    #[error("{0}")]
    Request(String),

    #[error("{0}")]
    Deserialization(String),

    #[error("{0}")]
    UrlParse(#[from] url::ParseError),

    #[error("{0} is only supported for GitHub Apps")]
    Unsupported(&'static str),
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Request(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Deserialization(e.to_string())
    }
}
