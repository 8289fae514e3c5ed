use axum::{
    extract::{RawQuery, State},
    http::HeaderMap,
    response::Response,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::pipeline::{self, Exchange};
use crate::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(search_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn search_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    let exchange = Exchange::from_parts(&headers, query.as_deref());
    pipeline::run(&state, exchange).await
}

/// Binds the listener, starts the prune task and serves until Ctrl-C.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let http_client = reqwest::Client::builder().build()?;
    let state = Arc::new(AppState::new(&config, http_client));

    let pruner = state.cache.spawn_pruner();
    info!(
        "Cache lifespan {:?}, pruning every {:?}",
        state.cache.lifespan(),
        state.cache.prune_interval()
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on port {}!", config.port);

    let served = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    pruner.abort();
    info!("Server stopped");
    served?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
