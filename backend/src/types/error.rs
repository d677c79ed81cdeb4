//! Error responses for the generation API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common_types::ErrorResponse;

/// Message returned when the prompt is missing, empty, or not a string.
pub const INVALID_PROMPT_MESSAGE: &str = "Invalid prompt. Please provide a text prompt.";

/// Application error type mapped onto the wire contract.
///
/// Only two failures ever reach the wire: malformed input at the boundary
/// (400) and a fault in the handler itself (500). Upstream generation
/// failures never become an `AppError`; they degrade into a 200 result with
/// a substituted image.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    body: ErrorResponse,
}

impl AppError {
    /// The caller did not supply a usable prompt.
    #[must_use]
    pub fn invalid_prompt() -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorResponse {
                error: INVALID_PROMPT_MESSAGE.to_string(),
                fallback: None,
            },
        }
    }

    /// Unexpected fault in the handler boundary itself.
    #[must_use]
    pub fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorResponse {
                error: "Internal server error".to_string(),
                fallback: Some(true),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error based on status code
        match self.status.as_u16() {
            400..=499 => tracing::warn!("Client error: {}", self.body.error),
            500..=599 => tracing::error!("Server error: {}", self.body.error),
            _ => {}
        }

        (self.status, Json(self.body)).into_response()
    }
}
