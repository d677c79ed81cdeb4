//! Uniform response envelope and error normalization.
//!
//! Every operation in this crate resolves to an [`ApiResponse`]; nothing at
//! or above this layer returns a bare transport error to its caller.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Fallback status used when a failure carries no upstream status.
pub const DEFAULT_ERROR_STATUS: u16 = 500;

/// Normalized error shape carried by failed envelopes.
///
/// Constructed exactly once, at the point the failure is first observed.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct ApiError {
    /// Machine-readable category, e.g. `GENERATION_ERROR`
    pub code: String,
    /// Human-readable description, never empty
    pub message: String,
    /// Raw upstream body or failure context, when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ApiError {
    /// Create an error with an explicit code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Attach a details payload.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Normalize a non-success upstream response.
    ///
    /// The code comes from the body's `code` field when the upstream sent
    /// one, the message from its `error`/`message` field, and the raw body
    /// is preserved as details.
    pub fn from_upstream(service: &str, status: u16, body: Option<&Value>) -> Self {
        let code = body
            .and_then(|b| b.get("code"))
            .and_then(Value::as_str)
            .map_or_else(|| format!("{}_ERROR", service_tag(service)), str::to_owned);

        let message = body
            .and_then(|b| b.get("error").or_else(|| b.get("message")))
            .and_then(Value::as_str)
            .map_or_else(|| format!("Request failed with status {status}"), str::to_owned);

        Self {
            code,
            message,
            details: body.cloned(),
        }
    }

    /// Normalize a transport-level failure (connect, timeout, body read).
    pub fn from_transport(service: &str, err: &reqwest::Error) -> Self {
        Self {
            code: format!("{}_ERROR", service_tag(service)),
            message: err.to_string(),
            details: Some(Value::String(format!("{err:?}"))),
        }
    }

    /// Wrap a failure that fits no known shape.
    pub fn from_unknown(service: &str, failure: &dyn std::fmt::Display) -> Self {
        let message = failure.to_string();
        Self {
            code: format!("{}_UNKNOWN_ERROR", service_tag(service)),
            message: if message.is_empty() {
                "An unexpected error occurred".to_string()
            } else {
                message
            },
            details: None,
        }
    }
}

/// Service name as it appears in error codes: `image-generation` ->
/// `IMAGE_GENERATION`.
pub(crate) fn service_tag(service: &str) -> String {
    service
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// The uniform success/failure wrapper returned by every operation.
///
/// Invariant: `success` is true iff `error` is `None`, and `data` is only
/// present on success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Payload, present only on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Normalized error, present only on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    /// HTTP status of the underlying call, or 500 when none applies
    pub status: u16,
    /// Whether the operation succeeded
    pub success: bool,
}

impl<T> ApiResponse<T> {
    /// Successful envelope.
    pub fn ok(data: T, status: u16) -> Self {
        Self {
            data: Some(data),
            error: None,
            status,
            success: true,
        }
    }

    /// Failed envelope.
    pub fn err(error: ApiError, status: u16) -> Self {
        Self {
            data: None,
            error: Some(error),
            status,
            success: false,
        }
    }
}
