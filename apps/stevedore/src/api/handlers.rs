//! # API Endpoint Handlers
//!
//! Every handler works on a fresh completed copy of the registry, so
//! requests never observe each other and the loaded configuration stays
//! untouched.

use super::{
    AppState,
    types::{
        ComponentsResponse, ErrorResponse, HealthResponse, ManifestResponse, OrderResponse,
        RenderRequest, RenderResponse,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use stevedore_core::{GrantedFeatures, Outcome, PipelineOptions, StevedoreError};

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(error))).into_response()
}

fn internal_error(error: &StevedoreError) -> Response {
    tracing::error!(error = %error, "request failed");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// COMPONENT HANDLERS
// =============================================================================

/// Completed components with dependency and license verdicts.
pub async fn components_handler(State(state): State<AppState>) -> Response {
    let installation = &state.installation;
    match installation.prepared_registry(false) {
        Ok((registry, _)) => (
            StatusCode::OK,
            Json(ComponentsResponse::from_registry(&registry, &installation.granted)),
        )
            .into_response(),
        Err(e) => internal_error(&e),
    }
}

/// Component names in dependency order.
pub async fn order_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(OrderResponse::from_registry(&state.installation.registry)),
    )
}

// =============================================================================
// RENDER HANDLERS
// =============================================================================

/// Run the pipeline over every component.
///
/// Always answers 200 with per-component outcomes; `clean` tells whether
/// every enabled component rendered.
pub async fn render_handler(
    State(state): State<AppState>,
    Json(request): Json<RenderRequest>,
) -> Response {
    let installation = &state.installation;
    let granted = match request.features {
        Some(features) => features.into_iter().collect(),
        None => installation.granted.clone(),
    };

    let (registry, auto_enabled) = match installation.prepared_registry(request.auto_enable) {
        Ok(prepared) => prepared,
        Err(e) => return internal_error(&e),
    };

    let pipeline = installation.pipeline(granted, PipelineOptions::default());
    let report = pipeline.evaluate(&registry, &installation.templates);

    (StatusCode::OK, Json(RenderResponse::new(&report, auto_enabled))).into_response()
}

/// Render a single component.
///
/// - 404: no such component
/// - 409: disabled, unmet dependencies or license not granted
/// - 422: the template failed to render
pub async fn manifest_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Response {
    let installation = &state.installation;
    let (registry, _) = match installation.prepared_registry(false) {
        Ok(prepared) => prepared,
        Err(e) => return internal_error(&e),
    };

    let granted: GrantedFeatures = installation.granted.clone();
    let pipeline = installation.pipeline(granted, PipelineOptions::default());

    let report = match pipeline.evaluate_one(&registry, &name, &installation.templates) {
        Ok(report) => report,
        Err(e @ StevedoreError::ComponentNotFound(_)) => {
            return error_response(StatusCode::NOT_FOUND, e.to_string());
        }
        Err(e) => return internal_error(&e),
    };

    match &report.outcome {
        Outcome::Rendered(manifest) => {
            (StatusCode::OK, Json(ManifestResponse::from(manifest))).into_response()
        }
        Outcome::RenderFailed(error) => {
            tracing::warn!(component = %name, error = %error, "manifest request failed to render");
            error_response(StatusCode::UNPROCESSABLE_ENTITY, error.to_string())
        }
        other => error_response(
            StatusCode::CONFLICT,
            other
                .reason()
                .unwrap_or_else(|| format!("component is {}", other.state())),
        ),
    }
}
