//! # Built-in Primitives
//!
//! Hardcoded defaults and limits for the Stevedore pipeline.
//!
//! These constants seed [`DefaultsTable::default`](crate::DefaultsTable) and bound
//! the work a single installer run may do. They are compiled into the binary;
//! a configuration file can override the defaults table but not the limits.

// =============================================================================
// NAMESPACES
// =============================================================================

/// Default namespace of the monitoring stack.
///
/// Also the default `monitoring_namespace` of the console, which links the two
/// by naming convention rather than by a declared dependency.
pub const MONITORING_NAMESPACE: &str = "monitoring";

/// Default namespace of the console UI.
pub const CONSOLE_NAMESPACE: &str = "caas4-console";

/// Default namespace of the platform gateway.
pub const GATEWAY_NAMESPACE: &str = "gap";

/// Default namespace of the image registry.
pub const REGISTRY_NAMESPACE: &str = "registry";

// =============================================================================
// REPLICAS
// =============================================================================

pub const MONITORING_REPLICAS: u32 = 1;
pub const CONSOLE_REPLICAS: u32 = 2;
pub const GATEWAY_REPLICAS: u32 = 2;
pub const REGISTRY_REPLICAS: u32 = 1;

// =============================================================================
// KIND-SPECIFIC SETTINGS
// =============================================================================

pub const MONITORING_RETENTION: &str = "15d";
pub const MONITORING_STORAGE_SIZE: &str = "10Gi";
pub const MONITORING_SCRAPE_INTERVAL: &str = "30s";

pub const CONSOLE_TITLE: &str = "CaaS Console";
pub const CONSOLE_RESOURCE_PATH: &str = "/console";

pub const GATEWAY_HOSTNAME: &str = "gateway.cluster.local";
pub const GATEWAY_ROUTE: &str = "/";

pub const REGISTRY_STORAGE_SIZE: &str = "20Gi";

/// TLS is on unless a component explicitly turns it off.
pub const TLS_ENABLED: bool = true;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length for component names.
///
/// Names end up as file names and Kubernetes object names; 63 is the DNS label limit.
pub const MAX_NAME_LENGTH: usize = 63;

/// Maximum number of components in a single registry.
pub const MAX_COMPONENTS: usize = 256;

/// Maximum template source size (1 MB).
///
/// Templates larger than this are rejected before parsing.
pub const MAX_TEMPLATE_SIZE: usize = 1024 * 1024;

/// Maximum nesting depth of `if`/`range` blocks in a template.
pub const MAX_BLOCK_DEPTH: usize = 32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_namespace_matches_installer_convention() {
        assert_eq!(CONSOLE_NAMESPACE, "caas4-console");
        assert_eq!(CONSOLE_REPLICAS, 2);
    }

    #[test]
    fn name_limit_is_dns_label() {
        assert_eq!(MAX_NAME_LENGTH, 63);
    }
}
