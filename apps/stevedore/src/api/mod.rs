//! # Stevedore HTTP API Module
//!
//! Read-only render API for tooling. Nothing here applies manifests; the
//! API renders and reports, exactly like `stevedore render --dry-run`.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /components` - Completed components with dependency and license verdicts
//! - `GET /order` - Component names in dependency order
//! - `POST /render` - Run the pipeline, optionally with other features or auto-enable
//! - `GET /components/{name}/manifest` - Render one component
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `STEVEDORE_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `STEVEDORE_API_KEY`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod types;

pub use auth::{API_KEY_ENV, get_api_key_from_env};
pub use handlers::{
    components_handler, health_handler, manifest_handler, order_handler, render_handler,
};
pub use types::{
    ComponentInfo, ComponentsResponse, ErrorResponse, HealthResponse, ManifestResponse,
    OrderResponse, OutcomeJson, RenderRequest, RenderResponse,
};

use crate::config::Installation;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use std::sync::Arc;
use stevedore_core::StevedoreError;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Maximum request body size (64 KB). Render requests are tiny.
pub const MAX_BODY_SIZE: usize = 64 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state: the loaded installation, read-only.
#[derive(Clone)]
pub struct AppState {
    pub installation: Arc<Installation>,
}

impl AppState {
    #[must_use]
    pub fn new(installation: Installation) -> Self {
        Self {
            installation: Arc::new(installation),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer from `STEVEDORE_CORS_ORIGINS`.
///
/// - `"*"`: any origin
/// - unset or no valid entry: localhost only
/// - otherwise: the comma-separated origins
fn build_cors_layer() -> CorsLayer {
    match std::env::var("STEVEDORE_CORS_ORIGINS").ok().as_deref() {
        Some("*") => {
            tracing::warn!("CORS: allowing ALL origins (STEVEDORE_CORS_ORIGINS=*)");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .split(',')
                .map(str::trim)
                .filter_map(|origin| match origin.parse::<HeaderValue>() {
                    Ok(value) => Some(value),
                    Err(e) => {
                        tracing::warn!("CORS: invalid origin '{}': {}", origin, e);
                        None
                    }
                })
                .collect();

            if allowed.is_empty() {
                build_localhost_cors()
            } else {
                restricted_cors(allowed)
            }
        }
        None => build_localhost_cors(),
    }
}

fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|origin| origin.parse().ok())
    .collect();
    restricted_cors(origins)
}

fn restricted_cors(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the router with all endpoints and middleware.
///
/// Layers, outer to inner: tracing, CORS, body limit, authentication.
pub fn create_router(state: AppState) -> Router {
    let has_auth = get_api_key_from_env().is_some();
    if has_auth {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "API key authentication DISABLED. Set {} to require a bearer token.",
            API_KEY_ENV
        );
    }

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/components", get(handlers::components_handler))
        .route("/components/{name}/manifest", get(handlers::manifest_handler))
        .route("/order", get(handlers::order_handler))
        .route("/render", post(handlers::render_handler));

    if has_auth {
        router = router.layer(axum_middleware::from_fn(auth::api_key_auth_middleware));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer())
                .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_SIZE)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Bind and serve until the process stops.
pub async fn run_server(addr: &str, installation: Installation) -> Result<(), StevedoreError> {
    let router = create_router(AppState::new(installation));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| StevedoreError::Io(format!("Bind failed: {}", e)))?;

    tracing::info!("Stevedore render API listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| StevedoreError::Io(format!("Server error: {}", e)))
}
