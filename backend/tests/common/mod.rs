//! Shared harness for router-level tests: a scriptable generation backend
//! and request helpers.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use backend::generation::{
    FallbackPool, GenerationError, GenerationService, GenerativeBackend, PredictionOutput,
};
use backend::routes;
use backend::state::AppState;

pub const TEST_MODEL: &str = "black-forest-labs/flux-schnell";
pub const TEST_PLACEHOLDER: &str = "/images/placeholder.svg";

/// What the stub backend does when invoked.
pub enum StubBehavior {
    /// Resolve with a single URL string
    Url(String),
    /// Resolve with a sequence of URLs
    UrlList(Vec<String>),
    /// Resolve with an output shape no caller expects
    Malformed,
    /// Fail with an upstream error message
    Fail(String),
}

/// Scriptable in-memory generation backend.
pub struct StubBackend {
    behavior: StubBehavior,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl StubBackend {
    pub fn new(behavior: StubBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl GenerativeBackend for StubBackend {
    async fn run(&self, _model: &str, prompt: &str) -> Result<PredictionOutput, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().expect("lock poisoned") = Some(prompt.to_owned());

        match &self.behavior {
            StubBehavior::Url(url) => Ok(PredictionOutput::new(Value::String(url.clone()))),
            StubBehavior::UrlList(urls) => Ok(PredictionOutput::new(serde_json::json!(urls))),
            StubBehavior::Malformed => {
                Ok(PredictionOutput::new(serde_json::json!({ "unexpected": true })))
            }
            StubBehavior::Fail(message) => {
                Err(GenerationError::UpstreamReported(message.clone()))
            }
        }
    }
}

/// Router wired to a test generation service.
pub struct TestContext {
    pub router: Router,
}

impl TestContext {
    pub fn new(backend: Option<Arc<dyn GenerativeBackend>>, fallback: FallbackPool) -> Self {
        setup_test_env();
        let generation = Arc::new(GenerationService::new(backend, TEST_MODEL, fallback));
        let router = routes::handler().with_state(AppState { generation });
        Self { router }
    }

    pub fn with_stub(behavior: StubBehavior, fallback: FallbackPool) -> (Self, Arc<StubBackend>) {
        let stub = StubBackend::new(behavior);
        let context = Self::new(Some(stub.clone() as Arc<dyn GenerativeBackend>), fallback);
        (context, stub)
    }

    pub async fn send_post_request(&self, route: &str, payload: Value) -> Response {
        self.send_raw_post(route, payload.to_string()).await
    }

    pub async fn send_raw_post(&self, route: &str, body: impl Into<String>) -> Response {
        let request = Request::builder()
            .uri(route)
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.into()))
            .expect("failed to build request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("request failed")
    }

    pub async fn send_get_request(&self, route: &str) -> Response {
        let request = Request::builder()
            .uri(route)
            .method("GET")
            .body(Body::empty())
            .expect("failed to build request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("request failed")
    }
}

/// A three-image fallback pool used by most tests.
pub fn test_pool() -> FallbackPool {
    FallbackPool::new(
        true,
        TEST_PLACEHOLDER,
        vec![
            "/images/fallbacks/sunrise.png".to_string(),
            "/images/fallbacks/mountain.png".to_string(),
            "/images/fallbacks/ocean.png".to_string(),
        ],
    )
}

/// Initialize tracing for tests
pub fn setup_test_env() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .ok();
}

pub async fn parse_response_body(response: Response) -> Value {
    use http_body_util::BodyExt;

    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("failed to read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is not JSON")
}
