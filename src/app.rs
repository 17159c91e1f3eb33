use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, services::ServeDir};

use crate::state::AppState;
use crate::{auth, records, telemetry};

pub fn build_app(state: AppState) -> Router {
    let assets = ServeDir::new(&state.static_dir);

    Router::new()
        .merge(auth::router())
        .merge(records::router())
        .route("/health", get(|| async { "ok" }))
        .nest_service("/static", assets)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(telemetry::http_trace())
}

/// Bind `addr` and serve until ctrl-c.
pub async fn serve(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
            }
            tracing::info!("shutting down");
        })
        .await?;
    Ok(())
}
