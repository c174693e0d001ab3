//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router with the API handlers (EPG, settings, versions)
//! - Wire up the trace layer
//! - Serve until Ctrl+C

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::epg::EpgProvider;
use crate::http::epg::epg_handler;
use crate::http::settings::{list_settings, update_setting};
use crate::lifecycle::Versions;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub epg: Arc<dyn EpgProvider>,
    pub versions: Versions,
}

/// HTTP server for the device API.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(state: AppState) -> Self {
        Self {
            router: Self::build_router(state),
        }
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/api/epg", get(epg_handler).post(epg_handler))
            .route("/api/settings", get(list_settings).post(update_setting))
            .route("/api/versions", get(get_versions))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn get_versions(State(state): State<AppState>) -> Json<Versions> {
    Json(state.versions)
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
