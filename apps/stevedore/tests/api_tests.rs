//! Integration tests for the Stevedore render API.
//!
//! Uses axum-test to drive the router without starting a real server.

// Tests hold the env mutex across awaits on purpose: they are serialized to
// avoid STEVEDORE_API_KEY conflicts.
#![allow(clippy::unwrap_used, clippy::panic, clippy::await_holding_lock)]

use axum::http::{HeaderValue, header};
use axum_test::TestServer;
use serde_json::json;
use std::path::Path;
use std::sync::Mutex;
use stevedore::api::{
    API_KEY_ENV, AppState, ComponentsResponse, ErrorResponse, HealthResponse, ManifestResponse,
    OrderResponse, RenderResponse, create_router,
};
use stevedore::config::{Installation, InstallerConfig, SAMPLE_CONFIG};
use stevedore_core::LifecycleState;

/// Serializes tests that touch environment variables.
static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Guard that holds the mutex and clears the API key on drop.
struct TestGuard {
    _guard: std::sync::MutexGuard<'static, ()>,
}

impl Drop for TestGuard {
    fn drop(&mut self) {
        // SAFETY: Tests run sequentially under ENV_TEST_MUTEX, so no concurrent env access.
        unsafe { std::env::remove_var(API_KEY_ENV) };
    }
}

fn sample_installation() -> Installation {
    let config = InstallerConfig::from_toml_str(SAMPLE_CONFIG).unwrap();
    Installation::from_config(config, Path::new("."), Some("monitoring,console,gateway")).unwrap()
}

fn server_for(installation: Installation, api_key: Option<&str>) -> (TestServer, TestGuard) {
    let guard = ENV_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    // SAFETY: Tests run sequentially under ENV_TEST_MUTEX, so no concurrent env access.
    unsafe {
        match api_key {
            Some(key) => std::env::set_var(API_KEY_ENV, key),
            None => std::env::remove_var(API_KEY_ENV),
        }
    }
    let router = create_router(AppState::new(installation));
    (TestServer::new(router).unwrap(), TestGuard { _guard: guard })
}

fn create_test_server() -> (TestServer, TestGuard) {
    server_for(sample_installation(), None)
}

// =============================================================================
// HEALTH ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (server, _guard) = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

// =============================================================================
// COMPONENT ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_components_are_completed() {
    let (server, _guard) = create_test_server();

    let response = server.get("/components").await;

    response.assert_status_ok();
    let body: ComponentsResponse = response.json();
    assert_eq!(body.components.len(), 4);

    let console = body.components.iter().find(|c| c.name == "console").unwrap();
    assert_eq!(console.namespace, "caas4-console");
    assert_eq!(console.license_tag, "console");
    assert!(console.authorized);
    assert!(console.unmet.is_empty());

    let registry = body.components.iter().find(|c| c.name == "registry").unwrap();
    assert!(!registry.enabled);
    assert!(!registry.authorized);
}

#[tokio::test]
async fn test_order_puts_dependencies_first() {
    let (server, _guard) = create_test_server();

    let response = server.get("/order").await;

    response.assert_status_ok();
    let body: OrderResponse = response.json();
    assert_eq!(body.order, vec!["monitoring", "gateway", "console", "registry"]);
}

// =============================================================================
// RENDER ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_render_all_granted() {
    let (server, _guard) = create_test_server();

    let response = server.post("/render").json(&json!({})).await;

    response.assert_status_ok();
    let body: RenderResponse = response.json();
    assert!(body.clean);
    assert_eq!(body.summary.rendered, 3);
    assert_eq!(body.summary.disabled, 1);

    let console = body.outcomes.iter().find(|o| o.component == "console").unwrap();
    assert_eq!(console.state, "rendered");
    let manifest = console.manifest.as_ref().unwrap();
    assert!(manifest.text.contains("namespace: caas4-console"));
    assert_eq!(manifest.digest.len(), 64);
}

#[tokio::test]
async fn test_render_with_fewer_features() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/render")
        .json(&json!({ "features": ["gateway"] }))
        .await;

    response.assert_status_ok();
    let body: RenderResponse = response.json();
    assert!(!body.clean);
    assert_eq!(body.summary.rejected, 2);

    let monitoring = body.outcomes.iter().find(|o| o.component == "monitoring").unwrap();
    assert_eq!(monitoring.state, "rejected");
    assert_eq!(monitoring.states.last(), Some(&LifecycleState::Rejected));
    assert!(monitoring.states.contains(&LifecycleState::Validated));
    assert!(!monitoring.states.contains(&LifecycleState::Authorized));
    assert!(monitoring.manifest.is_none());
    assert!(monitoring.reason.as_deref().unwrap().contains("monitoring"));
}

#[tokio::test]
async fn test_render_auto_enable() {
    let mut config = InstallerConfig::from_toml_str(SAMPLE_CONFIG).unwrap();
    config.components[1].enabled = false;
    let installation =
        Installation::from_config(config, Path::new("."), Some("monitoring,console,gateway")).unwrap();
    let (server, _guard) = server_for(installation, None);

    let before: RenderResponse = server.post("/render").json(&json!({})).await.json();
    assert!(!before.clean);
    let console = before.outcomes.iter().find(|o| o.component == "console").unwrap();
    assert_eq!(console.state, "unmet");

    let after: RenderResponse = server
        .post("/render")
        .json(&json!({ "auto_enable": true }))
        .await
        .json();
    assert!(after.clean);
    assert_eq!(after.auto_enabled, vec!["gateway"]);
}

#[tokio::test]
async fn test_render_rejects_unknown_fields() {
    let (server, _guard) = create_test_server();

    let response = server.post("/render").json(&json!({ "force": true })).await;

    assert!(response.status_code().is_client_error());
}

// =============================================================================
// MANIFEST ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_manifest_rendered() {
    let (server, _guard) = create_test_server();

    let response = server.get("/components/gateway/manifest").await;

    response.assert_status_ok();
    let body: ManifestResponse = response.json();
    assert_eq!(body.namespace, "gap");
    assert_eq!(body.file_name, "gateway.yaml");
    assert!(body.text.contains("- path: /api"));
}

#[tokio::test]
async fn test_manifest_unknown_component() {
    let (server, _guard) = create_test_server();

    let response = server.get("/components/ghost/manifest").await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn test_manifest_disabled_component_conflicts() {
    let (server, _guard) = create_test_server();

    let response = server.get("/components/registry/manifest").await;

    assert_eq!(response.status_code().as_u16(), 409);
    let body: ErrorResponse = response.json();
    assert!(body.error.contains("disabled"));
}

#[tokio::test]
async fn test_manifest_broken_template() {
    let mut installation = sample_installation();
    installation.templates.insert("gateway", "{{ .NoSuchField }}");
    let (server, _guard) = server_for(installation, None);

    let response = server.get("/components/gateway/manifest").await;

    assert_eq!(response.status_code().as_u16(), 422);
    let body: ErrorResponse = response.json();
    assert!(body.error.contains("NoSuchField"));
}

// =============================================================================
// AUTHENTICATION TESTS
// =============================================================================

#[tokio::test]
async fn test_auth_valid_bearer_token() {
    let api_key = "test-secret-key-12345";
    let (server, _guard) = server_for(sample_installation(), Some(api_key));

    let response = server
        .get("/order")
        .add_header(
            header::AUTHORIZATION,
            format!("Bearer {}", api_key).parse::<HeaderValue>().unwrap(),
        )
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_auth_invalid_token_rejected() {
    let (server, _guard) = server_for(sample_installation(), Some("correct-key"));

    let response = server
        .get("/order")
        .add_header(
            header::AUTHORIZATION,
            "Bearer wrong-key".parse::<HeaderValue>().unwrap(),
        )
        .await;

    assert_eq!(response.status_code().as_u16(), 401);
}

#[tokio::test]
async fn test_auth_missing_header_rejected() {
    let (server, _guard) = server_for(sample_installation(), Some("required-key"));

    let response = server.post("/render").json(&json!({})).await;

    assert_eq!(response.status_code().as_u16(), 401);
}

#[tokio::test]
async fn test_auth_health_endpoint_bypasses_auth() {
    let (server, _guard) = server_for(sample_installation(), Some("secret-key"));

    let response = server.get("/health").await;

    response.assert_status_ok();
}
