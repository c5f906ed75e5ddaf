use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

use crate::auth::AuthError;

/// Failures at the HTTP boundary. None of them allocates a connection.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] AuthError),

    #[error("user {user} may not join room '{room}'")]
    Forbidden { user: String, room: String },

    #[error("room id is required")]
    MissingRoom,
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::MissingRoom => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Terminal condition of one connection's read or write loop.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("read failed: {0}")]
    Read(String),

    #[error("write failed: {0}")]
    Write(String),

    #[error("no frame received within {0:?}")]
    ReadDeadline(Duration),

    #[error("write did not complete within {0:?}")]
    WriteDeadline(Duration),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
