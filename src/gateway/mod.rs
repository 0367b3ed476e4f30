//! Gateway module - HTTP API over the memory service
//!
//! ```text
//! GET  /                    liveness banner
//! GET  /api/health          index reachability (no auth)
//! POST /api/store-memory    remember a statement (bearer auth)
//! POST /api/search-memory   recall by meaning (bearer auth)
//! ```

pub mod auth;
pub mod handlers;
pub mod protocol;

use std::net::SocketAddr;

use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use secrecy::SecretString;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use crate::memory::MemoryService;
use protocol::ErrorResponse;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub service: MemoryService,
    pub api_key: Option<SecretString>,
}

impl AppState {
    pub fn new(service: MemoryService, api_key: Option<SecretString>) -> Self {
        AppState { service, api_key }
    }
}

// ---- Error Handling ----

/// `Error` rendered as `{success: false, error}`
#[derive(Debug)]
pub struct AppError(pub Error);

impl AppError {
    fn status(&self) -> StatusCode {
        let err = &self.0;
        if err.is_client_error() {
            match err {
                Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                _ => StatusCode::BAD_REQUEST,
            }
        } else if err.is_unavailable() {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }

        let message = match &self.0 {
            Error::Unauthorized(msg) | Error::InvalidInput(msg) => msg.clone(),
            other => other.to_string(),
        };
        let body = Json(ErrorResponse {
            success: false,
            error: message,
        });
        (status, body).into_response()
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        AppError(err)
    }
}

// ---- Router ----

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/store-memory", post(handlers::store_memory))
        .route("/api/search-memory", post(handlers::search_memory))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/api/health", get(handlers::health))
        .merge(protected)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind and serve until ctrl-c
pub async fn serve(config: &GatewayConfig, state: AppState) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.bind, config.port)
        .parse()
        .map_err(|e| Error::Config(format!("Invalid gateway address: {}", e)))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Memory assistant listening on http://{}", addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
