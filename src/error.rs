use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),
}

// Implement alias for Result to simplify usage
pub type AppResult<T> = Result<T, AppError>;

/// Failure of a single relay operation.
///
/// Upstream non-2xx answers are not errors; they are relayed verbatim.
#[derive(Error, Debug)]
pub enum RelayError {
    /// The inbound body could not be decoded for re-encoding.
    #[error("{0}")]
    InvalidBody(String),

    /// Building, sending or reading the outbound request failed.
    #[error("{0}")]
    Upstream(String),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            RelayError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RelayError::InvalidBody(_) => "Invalid request body",
            RelayError::Upstream(_) => "Proxy request failed",
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RelayError::Upstream(format!("Upstream request timed out: {}", e))
        } else {
            RelayError::Upstream(e.to_string())
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = json!({
            "error": self.label(),
            "details": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
