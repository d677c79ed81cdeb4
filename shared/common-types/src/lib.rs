//! Wire contract types shared between the backend and the API client.

use serde::{Deserialize, Serialize};

/// Request body for the image generation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageGenerationRequest {
    /// Text prompt describing the image to generate
    pub prompt: String,
}

/// Result of an image generation request.
///
/// `url` is always populated: when generation fails the backend substitutes
/// a fallback image and marks the result with `fallback: true` and an
/// explanatory `error`, so callers can always render something.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageGenerationResponse {
    /// URL of the generated (or substituted) image
    pub url: String,
    /// Echo of the prompt the image was generated for
    pub prompt: String,
    /// Model that produced the image, absent for fallback results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Upstream error message when the result is degraded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// True when the image is a substituted artifact, not a generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<bool>,
}

impl ImageGenerationResponse {
    /// Whether this result came from the fallback pool.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.fallback.unwrap_or(false)
    }
}

/// Error body returned by the backend for non-200 responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable description of the failure
    pub error: String,
    /// Present (and true) on handler-internal faults
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<bool>,
}
