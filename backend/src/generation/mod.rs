//! Image generation orchestration.
//!
//! [`GenerationService::generate`] is infallible by design: a missing
//! credential, an upstream failure, or a malformed prediction all degrade
//! into a usable result carrying a substituted image, an explanatory error
//! message, and the `fallback` marker. Callers never branch on failure.

pub mod error;
pub mod fallback;
pub mod replicate;

pub use error::GenerationError;
pub use fallback::{FallbackPool, DEFAULT_PLACEHOLDER_URL};
pub use replicate::{GenerativeBackend, PredictionOutput, ReplicateClient, DEFAULT_API_URL};

use std::sync::Arc;

use common_types::ImageGenerationResponse;
use tracing::{error, info, warn};

/// Style and quality qualifiers appended to every prompt before it is sent
/// upstream.
const PROMPT_QUALIFIERS: &str = "high quality, detailed, 4k, professional, \
     clear visualization, educational, minimalist style, elegant design";

/// Orchestrates the upstream generative backend and the fallback policy.
pub struct GenerationService {
    backend: Option<Arc<dyn GenerativeBackend>>,
    model: String,
    fallback: FallbackPool,
}

impl GenerationService {
    /// Build the service. `backend` is `None` when no upstream credential
    /// is configured; every generation then resolves from the fallback
    /// pool.
    pub fn new(
        backend: Option<Arc<dyn GenerativeBackend>>,
        model: impl Into<String>,
        fallback: FallbackPool,
    ) -> Self {
        Self {
            backend,
            model: model.into(),
            fallback,
        }
    }

    /// Generate an image for a prompt.
    pub async fn generate(&self, prompt: &str) -> ImageGenerationResponse {
        let Some(backend) = &self.backend else {
            warn!("No generation credential configured, serving fallback image");
            return self.degraded(prompt, "No API token configured");
        };

        let enhanced = enhance_prompt(prompt);
        info!(model = %self.model, "Dispatching prompt to generation backend");

        match backend.run(&self.model, &enhanced).await {
            Ok(output) => match output.into_url() {
                Ok(url) => {
                    info!("Image successfully generated");
                    ImageGenerationResponse {
                        url,
                        prompt: prompt.to_owned(),
                        model: Some(self.model.clone()),
                        error: None,
                        fallback: None,
                    }
                }
                Err(err) => {
                    error!(error = %err, "Generation backend output unusable");
                    self.degraded(prompt, &err.to_string())
                }
            },
            Err(err) => {
                error!(error = %err, "Generation backend call failed");
                self.degraded(prompt, &err.to_string())
            }
        }
    }

    fn degraded(&self, prompt: &str, reason: &str) -> ImageGenerationResponse {
        ImageGenerationResponse {
            url: self.fallback.select(),
            prompt: prompt.to_owned(),
            model: None,
            error: Some(reason.to_owned()),
            fallback: Some(true),
        }
    }
}

/// Expand the user prompt with fixed qualifiers for better results.
fn enhance_prompt(base: &str) -> String {
    format!("{base}, {PROMPT_QUALIFIERS}")
}
