//! `RelayServer` — the axum HTTP server wiring.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::response::{Html, Json};
use axum::routing::{get, post};
use axum::Router;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use voxlink_peer::LinkController;

use crate::api;
use crate::config::ServerConfig;
use crate::health::{self, HealthResponse};
use crate::shutdown::ShutdownCoordinator;

/// The control page, embedded so the binary is self-contained.
const INDEX_PAGE: &str = include_str!("../assets/index.html");

/// Shared state accessible from axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// The single process-wide link controller.
    pub link: Arc<LinkController>,
    /// When the server started.
    pub start_time: Instant,
}

/// The relay HTTP server.
pub struct RelayServer {
    config: ServerConfig,
    link: Arc<LinkController>,
    shutdown: Arc<ShutdownCoordinator>,
    start_time: Instant,
}

impl RelayServer {
    /// Create a new server around an existing link controller.
    pub fn new(config: ServerConfig, link: Arc<LinkController>) -> Self {
        Self {
            config,
            link,
            shutdown: Arc::new(ShutdownCoordinator::new()),
            start_time: Instant::now(),
        }
    }

    /// Build the axum router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            link: self.link.clone(),
            start_time: self.start_time,
        };

        Router::new()
            .route("/", get(index_handler))
            .route("/health", get(health_handler))
            .route("/api/connect", post(api::connect))
            .route("/api/disconnect", post(api::disconnect))
            .route("/api/status", get(api::status))
            .route("/api/send", post(api::send))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Bind the configured address and serve until shutdown.
    ///
    /// Returns the bound address (useful with port 0) and the serve task.
    pub async fn listen(&self) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
        let listener =
            tokio::net::TcpListener::bind((self.config.host.as_str(), self.config.port)).await?;
        let addr = listener.local_addr()?;

        let app = self.router();
        let token = self.shutdown.token();
        let handle = tokio::spawn(async move {
            let serve = axum::serve(listener, app)
                .with_graceful_shutdown(async move { token.cancelled().await });
            if let Err(e) = serve.await {
                error!(error = %e, "http server terminated");
            }
        });

        info!(%addr, "http surface listening");
        Ok((addr, handle))
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Get the link controller.
    pub fn link(&self) -> &Arc<LinkController> {
        &self.link
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// GET `/` — the embedded control page.
async fn index_handler() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

/// GET `/health`
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = state.link.snapshot().connected;
    Json(health::health_check(state.start_time, connected))
}
