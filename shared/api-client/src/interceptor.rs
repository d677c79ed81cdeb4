//! Explicit request/response interceptor chains.
//!
//! Interceptors are ordered lists of pure transforms over serializable
//! request and response records. The client applies the request chain before
//! dispatch and the response chain after receipt; the diagnostic logging
//! interceptors are identity transforms that log a redacted copy.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::redact;

/// Outgoing request as seen by the interceptor chain.
#[derive(Debug, Clone)]
pub struct RequestRecord {
    /// HTTP method name
    pub method: String,
    /// Fully resolved request URL
    pub url: String,
    /// Header name/value pairs, later entries overriding earlier ones
    pub headers: BTreeMap<String, String>,
    /// JSON body, if any
    pub body: Option<Value>,
}

/// Incoming response as seen by the interceptor chain.
#[derive(Debug, Clone)]
pub struct ResponseRecord {
    /// HTTP status code
    pub status: u16,
    /// Parsed JSON body, `None` when the body was empty or not JSON
    pub body: Option<Value>,
}

type RequestTransform = Arc<dyn Fn(RequestRecord) -> RequestRecord + Send + Sync>;
type ResponseTransform = Arc<dyn Fn(ResponseRecord) -> ResponseRecord + Send + Sync>;

/// Ordered transform chains applied by the request client.
#[derive(Clone, Default)]
pub struct Interceptors {
    request: Vec<RequestTransform>,
    response: Vec<ResponseTransform>,
}

impl Interceptors {
    /// Empty chains: requests and responses pass through untouched.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Chains that log every request and response through `tracing`, with
    /// sensitive fields redacted.
    #[must_use]
    pub fn diagnostic(service_name: &str) -> Self {
        let request_service = service_name.to_owned();
        let response_service = service_name.to_owned();

        Self::new()
            .on_request(move |record| {
                tracing::debug!(
                    service = %request_service,
                    method = %record.method,
                    url = %record.url,
                    headers = ?redact::sanitize_headers(&record.headers),
                    body = ?record.body.as_ref().map(redact::sanitize),
                    "API request"
                );
                record
            })
            .on_response(move |record| {
                let body = record.body.as_ref().map(redact::sanitize);
                match record.status {
                    500.. => tracing::error!(
                        service = %response_service,
                        status = record.status,
                        body = ?body,
                        "API error response"
                    ),
                    400..=499 => tracing::warn!(
                        service = %response_service,
                        status = record.status,
                        body = ?body,
                        "API error response"
                    ),
                    _ => tracing::debug!(
                        service = %response_service,
                        status = record.status,
                        body = ?body,
                        "API response"
                    ),
                }
                record
            })
    }

    /// Append a request transform; transforms run in insertion order.
    #[must_use]
    pub fn on_request<F>(mut self, transform: F) -> Self
    where
        F: Fn(RequestRecord) -> RequestRecord + Send + Sync + 'static,
    {
        self.request.push(Arc::new(transform));
        self
    }

    /// Append a response transform; transforms run in insertion order.
    #[must_use]
    pub fn on_response<F>(mut self, transform: F) -> Self
    where
        F: Fn(ResponseRecord) -> ResponseRecord + Send + Sync + 'static,
    {
        self.response.push(Arc::new(transform));
        self
    }

    pub(crate) fn apply_request(&self, record: RequestRecord) -> RequestRecord {
        self.request
            .iter()
            .fold(record, |record, transform| transform(record))
    }

    pub(crate) fn apply_response(&self, record: ResponseRecord) -> ResponseRecord {
        self.response
            .iter()
            .fold(record, |record, transform| transform(record))
    }
}
