//! HTTP server mode
//!
//! Hosts an [`AdapterRegistry`] behind a JSON API:
//!
//! - `POST /v1/get_page` - serve one `GetPage` request
//! - `GET /v1/datasources` - registered datasource types and their entities
//! - `GET /health`

use crate::adapter::AdapterRegistry;
use crate::engine::GetPageRequest;
use crate::error::{AdapterError, Error, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
}

/// Build the router serving `registry`
pub fn router(registry: AdapterRegistry) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/v1/datasources", get(list_datasources))
        .route("/v1/get_page", post(get_page))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(registry)
}

/// Start the HTTP server
pub async fn serve(registry: AdapterRegistry, config: ServerConfig) -> Result<()> {
    let app = router(registry);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting HTTP server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::config(format!("Failed to bind to port {}: {e}", config.port)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::config(format!("Server error: {e}")))?;

    Ok(())
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "version": crate::VERSION }))
}

async fn list_datasources(State(registry): State<AdapterRegistry>) -> impl IntoResponse {
    let datasources: Vec<_> = registry
        .datasource_types()
        .into_iter()
        .filter_map(|datasource_type| {
            let adapter = registry.get(datasource_type).ok()?;
            Some(json!({
                "type": datasource_type,
                "entities": adapter.entities().external_ids().collect::<Vec<_>>(),
            }))
        })
        .collect();

    Json(json!({ "datasources": datasources }))
}

async fn get_page(
    State(registry): State<AdapterRegistry>,
    Json(request): Json<GetPageRequest>,
) -> Response {
    match registry.handle(&request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: AdapterError) -> Response {
    let status = if error.code.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(json!({ "error": error }))).into_response()
}
