//! Environment configuration for different deployment stages

use std::env;

use crate::generation::{FallbackPool, DEFAULT_API_URL, DEFAULT_PLACEHOLDER_URL};

/// Model used when `IMAGE_MODEL` is not set.
pub const DEFAULT_IMAGE_MODEL: &str = "black-forest-labs/flux-schnell";

/// Application environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment
    Development,
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Panics
    ///
    /// Panics if `APP_ENV` contains an invalid value
    #[must_use]
    pub fn from_env() -> Self {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Self::Production,
            "staging" => Self::Staging,
            "development" => Self::Development,
            _ => panic!("Invalid environment: {env}"),
        }
    }

    /// Upstream credential, `None` when unset or empty. Without it the
    /// service still runs and serves fallback images.
    #[must_use]
    pub fn replicate_api_token(&self) -> Option<String> {
        env::var("REPLICATE_API_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty())
    }

    /// Base URL of the Replicate API, overridable for development.
    #[must_use]
    pub fn replicate_api_url(&self) -> String {
        env::var("REPLICATE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string())
    }

    /// Model identifier sent to the upstream service.
    #[must_use]
    pub fn image_model(&self) -> String {
        env::var("IMAGE_MODEL").unwrap_or_else(|_| DEFAULT_IMAGE_MODEL.to_string())
    }

    /// Fallback image configuration.
    ///
    /// `IMAGE_FALLBACK_POOL` is a comma-separated list of image URLs;
    /// `IMAGE_FALLBACK_ENABLED=false` disables the pool so only the
    /// placeholder is served.
    #[must_use]
    pub fn fallback_pool(&self) -> FallbackPool {
        let enabled = env::var("IMAGE_FALLBACK_ENABLED")
            .map(|value| value.trim().to_lowercase() != "false")
            .unwrap_or(true);

        let placeholder_url = env::var("IMAGE_PLACEHOLDER_URL")
            .unwrap_or_else(|_| DEFAULT_PLACEHOLDER_URL.to_string());

        let local_images = env::var("IMAGE_FALLBACK_POOL")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|entry| !entry.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        FallbackPool::new(enabled, placeholder_url, local_images)
    }
}
