//! # Completion Module
//!
//! Default completion for component descriptors.
//!
//! - Fill unset fields from an explicit defaults table keyed by kind
//! - Never touch fields that already hold a value
//! - Never fail
//! - Idempotent: completing twice equals completing once

use crate::descriptor::ComponentDescriptor;
use crate::primitives;
use crate::types::{ComponentKind, LicenseTag, StevedoreError};
use serde::{Deserialize, Serialize};

// =============================================================================
// DEFAULTS SECTIONS
// =============================================================================

/// Defaults for the monitoring kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitoringDefaults {
    pub namespace: String,
    pub license_tag: LicenseTag,
    pub replicas: u32,
    pub retention: String,
    pub storage_size: String,
    pub scrape_interval: String,
}

impl Default for MonitoringDefaults {
    fn default() -> Self {
        Self {
            namespace: primitives::MONITORING_NAMESPACE.to_string(),
            license_tag: LicenseTag::new(ComponentKind::Monitoring.as_str()),
            replicas: primitives::MONITORING_REPLICAS,
            retention: primitives::MONITORING_RETENTION.to_string(),
            storage_size: primitives::MONITORING_STORAGE_SIZE.to_string(),
            scrape_interval: primitives::MONITORING_SCRAPE_INTERVAL.to_string(),
        }
    }
}

/// Defaults for the console kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsoleDefaults {
    pub namespace: String,
    pub license_tag: LicenseTag,
    pub replicas: u32,
    pub title: String,
    pub tls: bool,
    pub resource_path: String,
}

impl Default for ConsoleDefaults {
    fn default() -> Self {
        Self {
            namespace: primitives::CONSOLE_NAMESPACE.to_string(),
            license_tag: LicenseTag::new(ComponentKind::Console.as_str()),
            replicas: primitives::CONSOLE_REPLICAS,
            title: primitives::CONSOLE_TITLE.to_string(),
            tls: primitives::TLS_ENABLED,
            resource_path: primitives::CONSOLE_RESOURCE_PATH.to_string(),
        }
    }
}

/// Defaults for the gateway kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayDefaults {
    pub namespace: String,
    pub license_tag: LicenseTag,
    pub replicas: u32,
    pub tls: bool,
    pub hostname: String,
    pub routes: Vec<String>,
}

impl Default for GatewayDefaults {
    fn default() -> Self {
        Self {
            namespace: primitives::GATEWAY_NAMESPACE.to_string(),
            license_tag: LicenseTag::new(ComponentKind::Gateway.as_str()),
            replicas: primitives::GATEWAY_REPLICAS,
            tls: primitives::TLS_ENABLED,
            hostname: primitives::GATEWAY_HOSTNAME.to_string(),
            routes: vec![primitives::GATEWAY_ROUTE.to_string()],
        }
    }
}

/// Defaults for the registry kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryDefaults {
    pub namespace: String,
    pub license_tag: LicenseTag,
    pub replicas: u32,
    pub storage_size: String,
    pub tls: bool,
}

impl Default for RegistryDefaults {
    fn default() -> Self {
        Self {
            namespace: primitives::REGISTRY_NAMESPACE.to_string(),
            license_tag: LicenseTag::new(ComponentKind::Registry.as_str()),
            replicas: primitives::REGISTRY_REPLICAS,
            storage_size: primitives::REGISTRY_STORAGE_SIZE.to_string(),
            tls: primitives::TLS_ENABLED,
        }
    }
}

// =============================================================================
// DEFAULTS TABLE
// =============================================================================

/// Defaults for every component kind.
///
/// `DefaultsTable::default()` holds the built-in constants from
/// [`primitives`]. Configuration can override any subset:
///
/// ```toml
/// [defaults.console]
/// namespace = "console"
/// replicas = 3
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultsTable {
    pub monitoring: MonitoringDefaults,
    pub console: ConsoleDefaults,
    pub gateway: GatewayDefaults,
    pub registry: RegistryDefaults,
}

impl DefaultsTable {
    /// Default namespace for a kind.
    ///
    /// An empty table entry falls back to the built-in namespace.
    #[must_use]
    pub fn namespace_for(&self, kind: ComponentKind) -> &str {
        let (configured, builtin) = match kind {
            ComponentKind::Monitoring => (&self.monitoring.namespace, primitives::MONITORING_NAMESPACE),
            ComponentKind::Console => (&self.console.namespace, primitives::CONSOLE_NAMESPACE),
            ComponentKind::Gateway => (&self.gateway.namespace, primitives::GATEWAY_NAMESPACE),
            ComponentKind::Registry => (&self.registry.namespace, primitives::REGISTRY_NAMESPACE),
        };
        or_builtin(configured, builtin)
    }

    /// Default license tag for a kind.
    ///
    /// An empty table entry falls back to the kind name.
    #[must_use]
    pub fn license_tag_for(&self, kind: ComponentKind) -> LicenseTag {
        let configured = match kind {
            ComponentKind::Monitoring => &self.monitoring.license_tag,
            ComponentKind::Console => &self.console.license_tag,
            ComponentKind::Gateway => &self.gateway.license_tag,
            ComponentKind::Registry => &self.registry.license_tag,
        };
        if configured.is_empty() {
            LicenseTag::new(kind.as_str())
        } else {
            configured.clone()
        }
    }

    /// Check that no entry is empty.
    ///
    /// Empty strings and empty route lists would otherwise complete a
    /// component to a value that still counts as unset.
    pub fn validate(&self) -> Result<(), StevedoreError> {
        let entries = [
            ("monitoring.namespace", self.monitoring.namespace.as_str()),
            ("monitoring.license_tag", self.monitoring.license_tag.as_str()),
            ("monitoring.retention", self.monitoring.retention.as_str()),
            ("monitoring.storage_size", self.monitoring.storage_size.as_str()),
            ("monitoring.scrape_interval", self.monitoring.scrape_interval.as_str()),
            ("console.namespace", self.console.namespace.as_str()),
            ("console.license_tag", self.console.license_tag.as_str()),
            ("console.title", self.console.title.as_str()),
            ("console.resource_path", self.console.resource_path.as_str()),
            ("gateway.namespace", self.gateway.namespace.as_str()),
            ("gateway.license_tag", self.gateway.license_tag.as_str()),
            ("gateway.hostname", self.gateway.hostname.as_str()),
            ("registry.namespace", self.registry.namespace.as_str()),
            ("registry.license_tag", self.registry.license_tag.as_str()),
            ("registry.storage_size", self.registry.storage_size.as_str()),
        ];

        for (key, value) in entries {
            if value.trim().is_empty() {
                return Err(StevedoreError::Config(format!(
                    "defaults.{} must not be empty",
                    key
                )));
            }
        }
        if self.gateway.routes.is_empty() || self.gateway.routes.iter().any(|r| r.trim().is_empty()) {
            return Err(StevedoreError::Config(
                "defaults.gateway.routes must list at least one non-empty route".to_string(),
            ));
        }
        Ok(())
    }
}

/// The configured value, or the built-in one when the configured value is empty.
pub(crate) fn or_builtin<'a>(configured: &'a str, builtin: &'a str) -> &'a str {
    if configured.is_empty() { builtin } else { configured }
}

// =============================================================================
// COMPLETION
// =============================================================================

/// The Completion pass fills unset descriptor fields.
pub struct Completion;

impl Completion {
    /// Complete a descriptor in place.
    ///
    /// Fills `namespace`, `license_tag` and every kind setting that is unset.
    /// `name`, `enabled`, `status` and `dependencies` are never touched.
    pub fn complete(descriptor: &mut ComponentDescriptor, table: &DefaultsTable) {
        let kind = descriptor.kind();

        if descriptor.namespace.is_empty() {
            descriptor.namespace = table.namespace_for(kind).to_string();
        }
        if descriptor.license_tag.is_empty() {
            descriptor.license_tag = table.license_tag_for(kind);
        }
        descriptor.settings.complete(table);
    }

    /// Complete a copy of a descriptor.
    #[must_use]
    pub fn completed(mut descriptor: ComponentDescriptor, table: &DefaultsTable) -> ComponentDescriptor {
        Self::complete(&mut descriptor, table);
        descriptor
    }

    /// Whether completion would change nothing.
    #[must_use]
    pub fn is_complete(descriptor: &ComponentDescriptor) -> bool {
        !descriptor.namespace.is_empty()
            && !descriptor.license_tag.is_empty()
            && descriptor.settings.is_complete()
    }
}

// =============================================================================
// TESTS
// =============================================================================
