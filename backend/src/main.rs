use std::sync::Arc;

use backend::generation::{GenerationService, GenerativeBackend, ReplicateClient};
use backend::{server, types::Environment};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let environment = Environment::from_env();

    // Configure logging format based on environment
    // Use JSON format for staging/production, regular format for development
    match environment {
        Environment::Production | Environment::Staging => {
            fmt()
                .json()
                .with_env_filter(EnvFilter::from_default_env())
                .init();
        }
        Environment::Development => {
            fmt().with_env_filter(EnvFilter::from_default_env()).init();
        }
    }

    let backend = environment.replicate_api_token().map(|token| {
        Arc::new(ReplicateClient::new(environment.replicate_api_url(), token))
            as Arc<dyn GenerativeBackend>
    });
    if backend.is_none() {
        tracing::warn!("REPLICATE_API_TOKEN is not set, all generations will serve fallback images");
    }

    let generation = Arc::new(GenerationService::new(
        backend,
        environment.image_model(),
        environment.fallback_pool(),
    ));

    server::start(generation).await
}
