//! # API Request/Response Types
//!
//! JSON structures of the HTTP API. The CLI's `--json-mode` output reuses
//! them so both surfaces print the same shapes.

use serde::{Deserialize, Serialize};
use stevedore_core::{
    ComponentDescriptor, ComponentReport, DependencyValidator, GrantedFeatures, LicenseGate,
    LifecycleState, Manifest, Registry, RunReport, RunSummary,
};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

// =============================================================================
// COMPONENTS
// =============================================================================

/// A completed component with its dependency and license verdicts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentInfo {
    pub name: String,
    pub kind: String,
    pub enabled: bool,
    pub namespace: String,
    pub license_tag: String,
    pub status: String,
    pub dependencies: Vec<String>,
    pub unmet: Vec<String>,
    pub authorized: bool,
}

impl ComponentInfo {
    #[must_use]
    pub fn new(registry: &Registry, descriptor: &ComponentDescriptor, granted: &GrantedFeatures) -> Self {
        let report = DependencyValidator::check(registry, descriptor);
        Self {
            name: descriptor.name.clone(),
            kind: descriptor.kind().to_string(),
            enabled: descriptor.enabled,
            namespace: descriptor.namespace.clone(),
            license_tag: descriptor.license_tag.to_string(),
            status: descriptor.status.as_str().to_string(),
            dependencies: descriptor.dependencies.clone(),
            authorized: LicenseGate::authorize(descriptor, granted),
            unmet: report.unmet,
        }
    }

    /// Whether an enabled component would pass validation and the license gate.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        !self.enabled || (self.unmet.is_empty() && self.authorized)
    }
}

/// Every registered component, in registration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentsResponse {
    pub components: Vec<ComponentInfo>,
}

impl ComponentsResponse {
    #[must_use]
    pub fn from_registry(registry: &Registry, granted: &GrantedFeatures) -> Self {
        Self {
            components: registry
                .iter()
                .map(|(_, d)| ComponentInfo::new(registry, d, granted))
                .collect(),
        }
    }
}

/// Component names, dependencies first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub order: Vec<String>,
}

impl OrderResponse {
    #[must_use]
    pub fn from_registry(registry: &Registry) -> Self {
        Self {
            order: registry
                .dependency_order()
                .into_iter()
                .filter_map(|id| registry.get(id).map(|d| d.name.clone()))
                .collect(),
        }
    }
}

// =============================================================================
// RENDER
// =============================================================================

/// Render request. Every field is optional; `{}` renders the configuration
/// as loaded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderRequest {
    /// Replace the granted license features for this request.
    pub features: Option<Vec<String>>,
    /// Switch on the dependencies of enabled components first.
    pub auto_enable: bool,
}

/// A rendered manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestResponse {
    pub component: String,
    pub namespace: String,
    pub file_name: String,
    pub digest: String,
    pub text: String,
}

impl From<&Manifest> for ManifestResponse {
    fn from(manifest: &Manifest) -> Self {
        Self {
            component: manifest.component.clone(),
            namespace: manifest.namespace.clone(),
            file_name: manifest.file_name(),
            digest: manifest.digest(),
            text: manifest.text.clone(),
        }
    }
}

/// Outcome of one component in a render run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeJson {
    pub component: String,
    pub kind: String,
    pub state: String,
    /// Lifecycle states passed through, ending in `state`.
    #[serde(default)]
    pub states: Vec<LifecycleState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<ManifestResponse>,
}

impl From<&ComponentReport> for OutcomeJson {
    fn from(report: &ComponentReport) -> Self {
        Self {
            component: report.component.clone(),
            kind: report.kind.to_string(),
            state: report.outcome.state().to_string(),
            states: report.states.clone(),
            reason: report.outcome.reason(),
            manifest: report.outcome.manifest().map(ManifestResponse::from),
        }
    }
}

/// Render run response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderResponse {
    pub clean: bool,
    pub summary: RunSummary,
    /// Dependencies switched on by `auto_enable`.
    pub auto_enabled: Vec<String>,
    pub outcomes: Vec<OutcomeJson>,
}

impl RenderResponse {
    #[must_use]
    pub fn new(report: &RunReport, auto_enabled: Vec<String>) -> Self {
        Self {
            clean: report.is_clean(),
            summary: report.summary(),
            auto_enabled,
            outcomes: report.outcomes().iter().map(OutcomeJson::from).collect(),
        }
    }
}
