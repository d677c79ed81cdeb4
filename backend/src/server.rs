use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::generation::GenerationService;
use crate::routes;
use crate::state::AppState;

/// Synchronous generation can take most of a minute upstream, so the
/// request timeout sits above the upstream client's own 60 s budget.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(75);

/// Starts the server with the given dependencies
///
/// # Errors
///
/// Returns an error if the server fails to start or bind to the port
pub async fn start(generation: Arc<GenerationService>) -> anyhow::Result<()> {
    let router = routes::handler()
        .with_state(AppState { generation })
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT));

    let addr = std::net::SocketAddr::from((
        [0, 0, 0, 0],
        std::env::var("PORT").map_or(Ok(8001), |p| p.parse())?,
    ));

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🔄 Word Canvas Backend started on http://{addr}");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(anyhow::Error::from)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install terminate signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
