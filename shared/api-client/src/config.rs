//! Per-service client configuration.

use std::time::Duration;

/// Default request timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Configuration supplied once at [`ApiClient`](crate::ApiClient)
/// construction and owned by that client for its lifetime.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Base URL every request path is resolved against
    pub base_url: String,
    /// Bearer credential injected as the `Authorization` header when set
    pub api_key: Option<String>,
    /// Transport-level timeout for every request
    pub default_timeout: Duration,
    /// Headers merged into every request
    pub default_headers: Vec<(String, String)>,
    /// When true, requests and responses are logged with sensitive fields
    /// redacted
    pub diagnostic_logging: bool,
}

impl ServiceConfig {
    /// Configuration with defaults for everything but the base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            default_timeout: DEFAULT_TIMEOUT,
            default_headers: Vec::new(),
            diagnostic_logging: false,
        }
    }

    /// Set the bearer credential.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Override the transport timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Add a header sent with every request.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Enable redacted request/response logging.
    #[must_use]
    pub const fn with_diagnostic_logging(mut self, enabled: bool) -> Self {
        self.diagnostic_logging = enabled;
        self
    }
}
