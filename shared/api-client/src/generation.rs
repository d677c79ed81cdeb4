//! Client for the image generation endpoint, mediated by the response
//! cache.
//!
//! Generation is never triggered implicitly: nothing happens until
//! [`ImageGenerationClient::generate`] is called. Each prompt maps to one
//! cache key, so repeated and concurrent triggers for the same prompt share
//! a single network call, and a settled result is served from memory until
//! explicitly regenerated.

use std::sync::Arc;

use common_types::{ImageGenerationRequest, ImageGenerationResponse};
use tokio::sync::watch;

use crate::cache::{CacheSnapshot, ReadState, ResponseCache};
use crate::client::{ApiClient, RequestOptions};
use crate::config::ServiceConfig;

/// Path of the generation endpoint, relative to the configured base URL.
pub const GENERATION_ENDPOINT: &str = "/v1/images/generations";

/// Image generation client: request client + per-prompt cache.
pub struct ImageGenerationClient {
    api: ApiClient,
    cache: Arc<ResponseCache<ImageGenerationResponse>>,
}

impl ImageGenerationClient {
    /// Build a generation client for the configured backend.
    #[must_use]
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            api: ApiClient::new("generation", config),
            cache: Arc::new(ResponseCache::new()),
        }
    }

    /// Cache key for a prompt.
    #[must_use]
    pub fn cache_key(prompt: &str) -> String {
        format!("image-gen-{prompt}")
    }

    /// Trigger generation for a prompt.
    ///
    /// Resolves with the cached result when one exists; otherwise posts to
    /// the generation endpoint through the deduplicating cache. The
    /// returned state always carries a well-formed envelope outcome: a
    /// degraded-but-usable result is a success here, and transport failures
    /// arrive as normalized errors, never as panics.
    pub async fn generate(&self, prompt: &str) -> ReadState<ImageGenerationResponse> {
        let key = Self::cache_key(prompt);
        let request = ImageGenerationRequest {
            prompt: prompt.to_owned(),
        };
        let api = &self.api;
        self.cache
            .read(Some(&key), move || async move {
                api.post(GENERATION_ENDPOINT, &request, RequestOptions::default())
                    .await
            })
            .await
    }

    /// Drop the cached result for a prompt and generate again.
    pub async fn regenerate(&self, prompt: &str) -> ReadState<ImageGenerationResponse> {
        let key = Self::cache_key(prompt);
        let request = ImageGenerationRequest {
            prompt: prompt.to_owned(),
        };
        let api = &self.api;
        self.cache
            .refresh(&key, move || async move {
                api.post(GENERATION_ENDPOINT, &request, RequestOptions::default())
                    .await
            })
            .await
    }

    /// Observe state changes for a prompt without triggering generation.
    pub async fn subscribe(
        &self,
        prompt: &str,
    ) -> watch::Receiver<CacheSnapshot<ImageGenerationResponse>> {
        self.cache.subscribe(&Self::cache_key(prompt)).await
    }

    /// The underlying cache, for manual updates and invalidation.
    #[must_use]
    pub fn cache(&self) -> &ResponseCache<ImageGenerationResponse> {
        &self.cache
    }
}
