//! # Core Type Definitions
//!
//! This module contains the small shared types of the Stevedore pipeline:
//! - Registry identifiers (`ComponentId`)
//! - The closed set of component kinds (`ComponentKind`)
//! - Opaque string newtypes (`LicenseTag`, `Status`)
//! - Error types (`StevedoreError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer identifiers only (no floating-point)
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`

use crate::template::TemplateError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// REGISTRY IDENTIFIERS
// =============================================================================

/// Index of a component inside a [`Registry`](crate::Registry) arena.
///
/// Ids are assigned in registration order and never reused within a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentId(pub usize);

impl ComponentId {
    /// Get the raw arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

// =============================================================================
// COMPONENT KIND
// =============================================================================

/// The closed set of deployable component kinds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// Metrics collection and dashboards.
    Monitoring,
    /// The web console UI.
    Console,
    /// The platform gateway (ingress for platform services).
    Gateway,
    /// The in-cluster image registry.
    Registry,
}

impl ComponentKind {
    /// All kinds, in declaration order.
    pub const ALL: [ComponentKind; 4] = [
        ComponentKind::Monitoring,
        ComponentKind::Console,
        ComponentKind::Gateway,
        ComponentKind::Registry,
    ];

    /// Stable lowercase name, as used in configuration files.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Monitoring => "monitoring",
            ComponentKind::Console => "console",
            ComponentKind::Gateway => "gateway",
            ComponentKind::Registry => "registry",
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// LICENSE TAG
// =============================================================================

/// Opaque license feature identifier.
///
/// The core never interprets a tag; it only compares tags for equality
/// against the granted feature set.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct LicenseTag(pub String);

impl LicenseTag {
    /// Create a new tag from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An empty tag is "unset" and is filled by completion.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for LicenseTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// STATUS
// =============================================================================

/// Free-form deployment status of a component ("pending", "ready", ...).
///
/// Set by whoever observes the cluster. The pipeline reads it for templates
/// and reports but never writes it.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Status(pub String);

impl Status {
    /// Create a new status from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the status as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Stevedore pipeline.
///
/// Unmet dependencies and missing license grants are NOT errors: they are
/// expected outcomes reported by [`Pipeline`](crate::Pipeline). Errors here
/// are configuration mistakes and broken templates.
#[derive(Debug, Error)]
pub enum StevedoreError {
    /// The descriptor is structurally invalid (empty or oversized name, ...).
    #[error("Invalid component: {0}")]
    InvalidComponent(String),

    /// A component with this name is already registered.
    #[error("Duplicate component: {0}")]
    DuplicateComponent(String),

    /// A component lists itself as a dependency.
    #[error("Component depends on itself: {0}")]
    SelfDependency(String),

    /// Registering the component would close a dependency cycle.
    #[error("Dependency cycle: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),

    /// The requested component is not registered.
    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    /// The registry already holds the maximum number of components.
    #[error("Registry full: at most {0} components")]
    RegistryFull(usize),

    /// Rendering failed.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// A configuration file could not be understood.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O error occurred (app layer only; the core does no I/O).
    #[error("I/O error: {0}")]
    Io(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_are_stable() {
        let names: Vec<_> = ComponentKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["monitoring", "console", "gateway", "registry"]);
    }

    #[test]
    fn kind_serde_uses_snake_case() {
        let json = serde_json::to_string(&ComponentKind::Console).expect("serialize");
        assert_eq!(json, "\"console\"");
    }

    #[test]
    fn license_tag_is_transparent() {
        let tag: LicenseTag = serde_json::from_str("\"console\"").expect("deserialize");
        assert_eq!(tag.as_str(), "console");
        assert!(LicenseTag::default().is_empty());
    }

    #[test]
    fn cycle_error_lists_path() {
        let err = StevedoreError::DependencyCycle(vec![
            "a".to_string(),
            "b".to_string(),
            "a".to_string(),
        ]);
        assert_eq!(err.to_string(), "Dependency cycle: a -> b -> a");
    }
}
