//! # Dependency Validator
//!
//! Checks that a component's declared dependencies are registered and enabled.
//!
//! - Reports every unmet dependency, never just the first
//! - Preserves declaration order in the report
//! - Inspects direct dependencies only
//! - Never fails: an unmet dependency is an outcome, not an error

use crate::descriptor::Component;
use crate::registry::Registry;
use serde::{Deserialize, Serialize};

/// Result of checking one component's dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DependencyReport {
    /// Component the report is about.
    pub component: String,
    /// Dependencies that are absent or disabled, in declaration order.
    pub unmet: Vec<String>,
}

impl DependencyReport {
    /// Whether every declared dependency is registered and enabled.
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        self.unmet.is_empty()
    }

    #[must_use]
    pub fn unmet(&self) -> &[String] {
        &self.unmet
    }

    /// The `(ok, unmet)` pair form of the report.
    #[must_use]
    pub fn into_parts(self) -> (bool, Vec<String>) {
        (self.unmet.is_empty(), self.unmet)
    }
}

/// The Dependency Validator.
///
/// Whether a disabled component should be checked at all is the caller's
/// decision; the validator checks whatever it is given.
pub struct DependencyValidator;

impl DependencyValidator {
    /// Check one component against the registry.
    ///
    /// A dependency is unmet when no component of that name is registered,
    /// or when the registered component is disabled.
    pub fn check<C: Component + ?Sized>(registry: &Registry, component: &C) -> DependencyReport {
        let unmet = component
            .dependencies()
            .iter()
            .filter(|name| {
                registry
                    .get_by_name(name)
                    .is_none_or(|dep| !dep.is_enabled())
            })
            .cloned()
            .collect();

        DependencyReport {
            component: component.name().to_string(),
            unmet,
        }
    }

    /// Check every registered component, in registration order.
    #[must_use]
    pub fn check_all(registry: &Registry) -> Vec<DependencyReport> {
        registry
            .iter()
            .map(|(_, descriptor)| Self::check(registry, descriptor))
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
