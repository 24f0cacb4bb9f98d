//! Error types for the signaling relay.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use signaling_medium::{ParseHexError, SignalingError};
use thiserror::Error;

/// Relay error types.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Signaling(#[from] SignalingError),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(&'static str),

    #[error("Invalid {field}: {source}")]
    InvalidHex {
        field: &'static str,
        source: ParseHexError,
    },

    #[error("Rate limit exceeded")]
    RateLimitExceeded,
}

impl RelayError {
    pub fn invalid_hex(field: &'static str) -> impl FnOnce(ParseHexError) -> Self {
        move |source| RelayError::InvalidHex { field, source }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            RelayError::Signaling(e) => match e {
                SignalingError::NameAlreadyRegistered(_) => {
                    (StatusCode::CONFLICT, "NAME_ALREADY_REGISTERED")
                }
                SignalingError::CallerIsNotAParticipant(_) => {
                    (StatusCode::FORBIDDEN, "CALLER_NOT_A_PARTICIPANT")
                }
                SignalingError::RecipientIsNotAParticipant(_) => {
                    (StatusCode::NOT_FOUND, "RECIPIENT_NOT_A_PARTICIPANT")
                }
                SignalingError::CannotConnectToItself => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "CANNOT_CONNECT_TO_ITSELF")
                }
                SignalingError::Repository(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR")
                }
            },
            RelayError::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            RelayError::InvalidHex { .. } => (StatusCode::BAD_REQUEST, "INVALID_HEX"),
            RelayError::RateLimitExceeded => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED"),
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
