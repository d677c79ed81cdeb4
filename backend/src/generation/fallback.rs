use rand::Rng;

/// Placeholder used when the local pool is disabled or empty.
pub const DEFAULT_PLACEHOLDER_URL: &str = "/images/placeholder.svg";

/// Pool of locally known images substituted when generation fails.
#[derive(Debug, Clone)]
pub struct FallbackPool {
    enabled: bool,
    placeholder_url: String,
    local_images: Vec<String>,
}

impl FallbackPool {
    /// Build a pool from configuration.
    pub fn new(
        enabled: bool,
        placeholder_url: impl Into<String>,
        local_images: Vec<String>,
    ) -> Self {
        Self {
            enabled,
            placeholder_url: placeholder_url.into(),
            local_images,
        }
    }

    /// Pool that always resolves to the single placeholder URL.
    pub fn placeholder_only(placeholder_url: impl Into<String>) -> Self {
        Self::new(false, placeholder_url, Vec::new())
    }

    /// Pick a fallback image: uniformly at random from the pool when it is
    /// enabled and non-empty, the placeholder otherwise.
    #[must_use]
    pub fn select(&self) -> String {
        if self.enabled && !self.local_images.is_empty() {
            let index = rand::thread_rng().gen_range(0..self.local_images.len());
            self.local_images[index].clone()
        } else {
            self.placeholder_url.clone()
        }
    }

    /// The configured placeholder URL.
    #[must_use]
    pub fn placeholder_url(&self) -> &str {
        &self.placeholder_url
    }

    /// The configured pool images.
    #[must_use]
    pub fn images(&self) -> &[String] {
        &self.local_images
    }
}
