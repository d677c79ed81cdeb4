//! Error-normalizing HTTP request client.
//!
//! One [`ApiClient`] is constructed per remote service. Every call resolves
//! to an [`ApiResponse`]; transport failures, non-success statuses, and
//! decode failures are normalized into [`ApiError`]s instead of propagating.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::config::ServiceConfig;
use crate::envelope::{ApiError, ApiResponse, DEFAULT_ERROR_STATUS};
use crate::interceptor::{Interceptors, RequestRecord, ResponseRecord};

/// Maximum number of idle connections to maintain per host.
const MAX_IDLE_CONNECTIONS_PER_HOST: usize = 10;

/// Per-request overrides for a single call.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Extra headers for this request, overriding configured defaults
    pub headers: Vec<(String, String)>,
    /// Timeout override for this request
    pub timeout: Option<Duration>,
}

/// HTTP client bound to a single service configuration.
pub struct ApiClient {
    service_name: String,
    config: ServiceConfig,
    http: Client,
    interceptors: Interceptors,
}

impl ApiClient {
    /// Build a client for a service. The diagnostic logging chain is
    /// installed when the configuration asks for it.
    #[must_use]
    pub fn new(service_name: impl Into<String>, config: ServiceConfig) -> Self {
        let service_name = service_name.into();
        let interceptors = if config.diagnostic_logging {
            Interceptors::diagnostic(&service_name)
        } else {
            Interceptors::new()
        };
        Self::with_interceptors(service_name, config, interceptors)
    }

    /// Build a client with an explicit interceptor chain.
    #[must_use]
    pub fn with_interceptors(
        service_name: impl Into<String>,
        config: ServiceConfig,
        interceptors: Interceptors,
    ) -> Self {
        let http = Client::builder()
            .timeout(config.default_timeout)
            .pool_max_idle_per_host(MAX_IDLE_CONNECTIONS_PER_HOST)
            .user_agent(format!(
                "word-canvas-api-client/{}",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            service_name: service_name.into(),
            config,
            http,
            interceptors,
        }
    }

    /// Name this client logs and tags errors with.
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Perform a GET request.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> ApiResponse<T> {
        self.execute(Method::GET, path, None, options).await
    }

    /// Perform a POST request with a JSON body.
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> ApiResponse<T> {
        let body = match serde_json::to_value(body) {
            Ok(value) => Some(value),
            Err(err) => {
                return ApiResponse::err(
                    ApiError::from_unknown(&self.service_name, &err),
                    DEFAULT_ERROR_STATUS,
                )
            }
        };
        self.execute(Method::POST, path, body, options).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        options: RequestOptions,
    ) -> ApiResponse<T> {
        let url = match self.endpoint(path) {
            Ok(url) => url,
            Err(error) => return ApiResponse::err(error, DEFAULT_ERROR_STATUS),
        };

        let record = self.interceptors.apply_request(RequestRecord {
            method: method.to_string(),
            url: url.to_string(),
            headers: self.merged_headers(&options),
            body,
        });

        // The transformed record is authoritative, including its URL.
        let url = match Url::parse(&record.url) {
            Ok(url) => url,
            Err(err) => {
                return ApiResponse::err(
                    ApiError::from_unknown(&self.service_name, &err),
                    DEFAULT_ERROR_STATUS,
                )
            }
        };

        let mut request = self.http.request(method, url);
        for (name, value) in &record.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &record.body {
            request = request.json(body);
        }
        if let Some(timeout) = options.timeout {
            request = request.timeout(timeout);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => return self.transport_failure(&err),
        };

        let status = response.status().as_u16();
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(err) => return self.transport_failure(&err),
        };
        let body = serde_json::from_slice::<Value>(&bytes).ok();

        let record = self
            .interceptors
            .apply_response(ResponseRecord { status, body });

        if (200..300).contains(&status) {
            return match serde_json::from_value(record.body.unwrap_or(Value::Null)) {
                Ok(data) => ApiResponse::ok(data, status),
                Err(err) => ApiResponse::err(
                    ApiError::new(
                        format!("{}_ERROR", crate::envelope::service_tag(&self.service_name)),
                        format!("Failed to decode response body: {err}"),
                    ),
                    status,
                ),
            };
        }

        ApiResponse::err(
            ApiError::from_upstream(&self.service_name, status, record.body.as_ref()),
            status,
        )
    }

    fn transport_failure<T>(&self, err: &reqwest::Error) -> ApiResponse<T> {
        if self.config.diagnostic_logging {
            tracing::error!(service = %self.service_name, error = %err, "API transport error");
        }
        let status = err
            .status()
            .map_or(DEFAULT_ERROR_STATUS, |status| status.as_u16());
        ApiResponse::err(ApiError::from_transport(&self.service_name, err), status)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let base = Url::parse(&self.config.base_url)
            .map_err(|err| ApiError::from_unknown(&self.service_name, &err))?;
        base.join(path)
            .map_err(|err| ApiError::from_unknown(&self.service_name, &err))
    }

    fn merged_headers(&self, options: &RequestOptions) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        if let Some(api_key) = &self.config.api_key {
            headers.insert("authorization".to_string(), format!("Bearer {api_key}"));
        }
        for (name, value) in &self.config.default_headers {
            headers.insert(name.clone(), value.clone());
        }
        for (name, value) in &options.headers {
            headers.insert(name.clone(), value.clone());
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_and_path() {
        let client = ApiClient::new(
            "generation",
            ServiceConfig::new("https://api.example.com/base/"),
        );

        let url = client.endpoint("v1/images/generations").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/base/v1/images/generations"
        );
    }

    #[test]
    fn invalid_base_url_is_normalized_not_panicked() {
        let client = ApiClient::new("generation", ServiceConfig::new("not a url"));

        let error = client.endpoint("/x").unwrap_err();
        assert_eq!(error.code, "GENERATION_UNKNOWN_ERROR");
        assert!(!error.message.is_empty());
    }

    #[test]
    fn api_key_is_injected_as_bearer_header() {
        let client = ApiClient::new(
            "generation",
            ServiceConfig::new("https://api.example.com").with_api_key("r8_live_abc"),
        );

        let headers = client.merged_headers(&RequestOptions::default());
        assert_eq!(headers["authorization"], "Bearer r8_live_abc");
    }

    #[test]
    fn request_options_override_default_headers() {
        let client = ApiClient::new(
            "generation",
            ServiceConfig::new("https://api.example.com").with_header("x-env", "default"),
        );

        let options = RequestOptions {
            headers: vec![("x-env".to_string(), "override".to_string())],
            timeout: None,
        };
        let headers = client.merged_headers(&options);
        assert_eq!(headers["x-env"], "override");
    }
}
