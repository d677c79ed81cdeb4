//! Client for the Replicate predictions API.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::GenerationError;

/// Default Replicate API host.
pub const DEFAULT_API_URL: &str = "https://api.replicate.com";

/// Predictions run synchronously (`Prefer: wait`), so the timeout covers
/// model execution, not just the round trip.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Maximum number of idle connections to maintain per host.
const MAX_IDLE_CONNECTIONS_PER_HOST: usize = 10;

/// Raw prediction output: either a single URL or a sequence of URLs.
#[derive(Debug, Clone)]
pub struct PredictionOutput(Value);

impl PredictionOutput {
    /// Wrap a raw output value.
    #[must_use]
    pub const fn new(value: Value) -> Self {
        Self(value)
    }

    /// Extract the image URL: the string itself, or the first element of a
    /// sequence.
    pub fn into_url(self) -> Result<String, GenerationError> {
        match self.0 {
            Value::String(url) if !url.is_empty() => Ok(url),
            Value::Array(items) => items
                .into_iter()
                .next()
                .and_then(|item| match item {
                    Value::String(url) if !url.is_empty() => Some(url),
                    _ => None,
                })
                .ok_or(GenerationError::UnexpectedOutput),
            _ => Err(GenerationError::UnexpectedOutput),
        }
    }
}

/// A generative image model invoked with an already-enhanced prompt.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Run one prediction. Exactly one attempt; no retries at this layer.
    async fn run(&self, model: &str, prompt: &str) -> Result<PredictionOutput, GenerationError>;
}

#[derive(Debug, Serialize)]
struct PredictionRequest<'a> {
    input: PredictionInput<'a>,
}

#[derive(Debug, Serialize)]
struct PredictionInput<'a> {
    prompt: &'a str,
    prompt_upsampling: bool,
    width: u32,
    height: u32,
    num_inference_steps: u32,
    scheduler: &'a str,
    guidance_scale: f32,
}

impl<'a> PredictionInput<'a> {
    const fn standard(prompt: &'a str) -> Self {
        Self {
            prompt,
            prompt_upsampling: true,
            width: 512,
            height: 512,
            num_inference_steps: 25,
            scheduler: "K_EULER",
            guidance_scale: 7.5,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PredictionResponse {
    #[serde(default)]
    output: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

/// HTTP client for Replicate with connection pooling and bearer auth.
pub struct ReplicateClient {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl ReplicateClient {
    /// Build a client for the given API host and token.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .pool_max_idle_per_host(MAX_IDLE_CONNECTIONS_PER_HOST)
            .user_agent(format!("word-canvas-backend/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            base_url: base_url.into(),
            api_token: api_token.into(),
        }
    }
}

#[async_trait]
impl GenerativeBackend for ReplicateClient {
    async fn run(&self, model: &str, prompt: &str) -> Result<PredictionOutput, GenerationError> {
        let url = format!("{}/v1/models/{model}/predictions", self.base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_token)
            .header("Prefer", "wait")
            .json(&PredictionRequest {
                input: PredictionInput::standard(prompt),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GenerationError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        let prediction: PredictionResponse = response.json().await?;

        if let Some(error) = prediction.error {
            if !error.is_null() {
                let message = error
                    .as_str()
                    .map_or_else(|| error.to_string(), str::to_owned);
                return Err(GenerationError::UpstreamReported(message));
            }
        }

        prediction
            .output
            .map(PredictionOutput::new)
            .ok_or(GenerationError::MissingOutput)
    }
}
