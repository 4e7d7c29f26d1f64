//! Error types for the HTTP and `WebSocket` layer.
//!
//! [`ApiError`] covers both surfaces. Over HTTP it becomes a JSON response
//! through its [`IntoResponse`] implementation; over a `WebSocket` session
//! its message is sent back as an error frame.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use colony_core::GatewayError;
use colony_grid::GridError;

/// Errors that can occur while handling a request or an inbound message.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request or message could not be understood.
    #[error("malformed request: {0}")]
    Malformed(String),

    /// The request was understood but failed validation.
    #[error(transparent)]
    Invalid(#[from] GridError),

    /// The mutation gateway rejected the change.
    #[error(transparent)]
    Rejected(#[from] GatewayError),

    /// A serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Malformed(_) | Self::Invalid(_) | Self::Rejected(_) => StatusCode::BAD_REQUEST,
            Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
