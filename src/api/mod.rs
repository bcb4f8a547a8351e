//! Timeline REST API
//!
//! Local HTTP surface publishing the timeline state to a presentation
//! layer, built with Axum.
//!
//! # Endpoints
//!
//! ## Timeline
//! - `GET /api/v1/timeline` - Current state (id, posts, loading and error status)
//! - `POST /api/v1/timeline` - Create a new shared timeline
//! - `DELETE /api/v1/timeline` - Forget the current timeline
//! - `POST /api/v1/timeline/refresh` - Re-run reconciliation
//!
//! ## Posts
//! - `GET /api/v1/posts` - Reconciled posts, newest first
//! - `POST /api/v1/posts` - Submit a post
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health` - Full health status

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route(
            "/timeline",
            get(routes::timeline::get_timeline)
                .post(routes::timeline::create_timeline)
                .delete(routes::timeline::clear_timeline),
        )
        .route("/timeline/refresh", post(routes::timeline::refresh_timeline))
        .route(
            "/posts",
            get(routes::posts::list_posts).post(routes::posts::create_post),
        );

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/", get(routes::health::full_health));

    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(shared_state)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Timeline API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Timeline API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
