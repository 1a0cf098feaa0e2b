//! Dynamics 365 Tool Server
//!
//! A REST API, SSE and WebSocket server exposing a fixed catalog of
//! operations against a Dynamics 365 Finance & Operations environment.

use axum::{
    extract::Request,
    middleware::Next,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use d365_tools::api;
use d365_tools::catalog::{EntityMatcher, EntityRegistry};
use d365_tools::config::Config;
use d365_tools::gateway::HttpGateway;
use d365_tools::state::AppState;
use d365_tools::tools::Toolbox;
use d365_tools::websocket;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

#[derive(Serialize)]
struct HelloResponse {
    message: String,
    status: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    message: String,
}

/// Request ID middleware - adds unique ID to each request for tracing
async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    let response = next.run(request).instrument(span).await;

    let duration = start.elapsed();
    info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status().as_u16(),
        duration_ms = duration.as_millis(),
        "Request completed"
    );

    response
}

/// Catalog from `ENTITY_CATALOG_PATH`, or the builtin one
fn load_registry(config: &Config) -> EntityRegistry {
    let Some(path) = config.query.entity_catalog_path.as_deref() else {
        return EntityRegistry::builtin();
    };

    match EntityRegistry::load_from_file(path) {
        Ok(registry) => {
            info!(path = %path, entities = registry.len(), "Loaded entity catalog");
            registry
        }
        Err(e) => {
            warn!(path = %path, error = %e, "Failed to load entity catalog, using builtin");
            EntityRegistry::builtin()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load configuration
    let config = Config::from_env();
    info!("Configuration loaded: {:?}", config);

    let missing = config.dynamics.missing_settings();
    if !missing.is_empty() {
        warn!(missing = ?missing, "Backend credentials incomplete; operations will return errors");
    }

    let registry = Arc::new(load_registry(&config));
    let gateway = HttpGateway::new(&config.dynamics)?;
    let toolbox = Toolbox::new(
        Arc::new(gateway),
        EntityMatcher::new(registry),
        config.query.default_page_size,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let app_state = Arc::new(AppState::new(toolbox, shutdown_rx));

    // Build our application with routes
    let app = Router::new()
        // Health check and hello world
        .route("/", get(hello_world))
        .route("/api/health", get(health_check))
        // Operation catalog
        .route("/api/tools", get(api::tools::list_tools))
        .route("/api/tools/:name", post(api::tools::invoke_tool))
        .route("/api/tools/:name/stream", post(api::tools::invoke_tool_stream))
        // WebSocket notification feed
        .route("/ws", get(websocket::websocket_handler))
        // Middleware (order matters - request_id should be first)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Bind to address from config
    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid server address: {}", e))?;

    info!("Server running on http://{}", addr);
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // Running workflows stop before their next line
            let _ = shutdown_tx.send(true);
        })
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Handle graceful shutdown signals (Ctrl+C, SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}

async fn hello_world() -> Json<HelloResponse> {
    Json(HelloResponse {
        message: "Hello from the Dynamics 365 tool server!".to_string(),
        status: "ok".to_string(),
    })
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        message: "Server is healthy".to_string(),
    })
}
