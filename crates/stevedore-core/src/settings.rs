//! # Kind Settings
//!
//! Per-kind configuration of a component: one settings struct per
//! [`ComponentKind`], tied together by the [`ComponentSettings`] tagged union.
//!
//! Every field is optional until completion. A string holding `""` or a list
//! holding no entries counts as unset, exactly like `None`.

use crate::completion::{DefaultsTable, or_builtin};
use crate::primitives;
use crate::types::ComponentKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// KIND SETTINGS TRAIT
// =============================================================================

/// Behaviour shared by every kind's settings.
pub trait KindSettings {
    /// The kind these settings belong to.
    const KIND: ComponentKind;

    /// Fill every unset field from the defaults table.
    ///
    /// Must be idempotent: a second call changes nothing.
    fn complete(&mut self, table: &DefaultsTable);

    /// Whether every field holds a value.
    fn is_complete(&self) -> bool;

    /// Write the render context fields (PascalCase keys) for templates.
    fn write_context(&self, context: &mut Map<String, Value>);
}

// =============================================================================
// FILL HELPERS
// =============================================================================

fn fill_str(slot: &mut Option<String>, default: &str) {
    if slot.as_deref().is_none_or(str::is_empty) {
        *slot = Some(default.to_string());
    }
}

fn fill<T: Copy>(slot: &mut Option<T>, default: T) {
    if slot.is_none() {
        *slot = Some(default);
    }
}

fn fill_routes(slot: &mut Option<Vec<String>>, default: &[String]) {
    if slot.as_ref().is_none_or(Vec::is_empty) {
        *slot = Some(if default.is_empty() {
            vec![primitives::GATEWAY_ROUTE.to_string()]
        } else {
            default.to_vec()
        });
    }
}

fn str_set(slot: &Option<String>) -> bool {
    slot.as_deref().is_some_and(|s| !s.is_empty())
}

// =============================================================================
// MONITORING
// =============================================================================

/// Settings of the monitoring stack.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitoringSettings {
    pub replicas: Option<u32>,
    /// Metrics retention period ("15d").
    pub retention: Option<String>,
    pub storage_size: Option<String>,
    pub scrape_interval: Option<String>,
}

impl KindSettings for MonitoringSettings {
    const KIND: ComponentKind = ComponentKind::Monitoring;

    fn complete(&mut self, table: &DefaultsTable) {
        let d = &table.monitoring;
        fill(&mut self.replicas, d.replicas);
        fill_str(&mut self.retention, or_builtin(&d.retention, primitives::MONITORING_RETENTION));
        fill_str(
            &mut self.storage_size,
            or_builtin(&d.storage_size, primitives::MONITORING_STORAGE_SIZE),
        );
        fill_str(
            &mut self.scrape_interval,
            or_builtin(&d.scrape_interval, primitives::MONITORING_SCRAPE_INTERVAL),
        );
    }

    fn is_complete(&self) -> bool {
        self.replicas.is_some()
            && str_set(&self.retention)
            && str_set(&self.storage_size)
            && str_set(&self.scrape_interval)
    }

    fn write_context(&self, context: &mut Map<String, Value>) {
        context.insert("Replicas".into(), Value::from(self.replicas));
        context.insert("Retention".into(), Value::from(self.retention.clone()));
        context.insert("StorageSize".into(), Value::from(self.storage_size.clone()));
        context.insert(
            "ScrapeInterval".into(),
            Value::from(self.scrape_interval.clone()),
        );
    }
}

// =============================================================================
// CONSOLE
// =============================================================================

/// Settings of the console UI.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsoleSettings {
    pub replicas: Option<u32>,
    pub title: Option<String>,
    pub tls: Option<bool>,
    /// URL path the console is served under.
    pub resource_path: Option<String>,
    /// Namespace the console reads metrics from.
    ///
    /// Defaults to the monitoring kind's default namespace. This is a naming
    /// convention only; it does not make monitoring a dependency.
    pub monitoring_namespace: Option<String>,
}

impl KindSettings for ConsoleSettings {
    const KIND: ComponentKind = ComponentKind::Console;

    fn complete(&mut self, table: &DefaultsTable) {
        let d = &table.console;
        fill(&mut self.replicas, d.replicas);
        fill_str(&mut self.title, or_builtin(&d.title, primitives::CONSOLE_TITLE));
        fill(&mut self.tls, d.tls);
        fill_str(
            &mut self.resource_path,
            or_builtin(&d.resource_path, primitives::CONSOLE_RESOURCE_PATH),
        );
        fill_str(
            &mut self.monitoring_namespace,
            table.namespace_for(ComponentKind::Monitoring),
        );
    }

    fn is_complete(&self) -> bool {
        self.replicas.is_some()
            && str_set(&self.title)
            && self.tls.is_some()
            && str_set(&self.resource_path)
            && str_set(&self.monitoring_namespace)
    }

    fn write_context(&self, context: &mut Map<String, Value>) {
        context.insert("Replicas".into(), Value::from(self.replicas));
        context.insert("Title".into(), Value::from(self.title.clone()));
        context.insert("Tls".into(), Value::from(self.tls));
        context.insert(
            "ResourcePath".into(),
            Value::from(self.resource_path.clone()),
        );
        context.insert(
            "MonitoringNamespace".into(),
            Value::from(self.monitoring_namespace.clone()),
        );
    }
}

// =============================================================================
// GATEWAY
// =============================================================================

/// Settings of the platform gateway.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySettings {
    pub replicas: Option<u32>,
    pub tls: Option<bool>,
    pub hostname: Option<String>,
    /// Path prefixes routed through the gateway.
    pub routes: Option<Vec<String>>,
}

impl KindSettings for GatewaySettings {
    const KIND: ComponentKind = ComponentKind::Gateway;

    fn complete(&mut self, table: &DefaultsTable) {
        let d = &table.gateway;
        fill(&mut self.replicas, d.replicas);
        fill(&mut self.tls, d.tls);
        fill_str(&mut self.hostname, or_builtin(&d.hostname, primitives::GATEWAY_HOSTNAME));
        fill_routes(&mut self.routes, &d.routes);
    }

    fn is_complete(&self) -> bool {
        self.replicas.is_some()
            && self.tls.is_some()
            && str_set(&self.hostname)
            && self.routes.as_ref().is_some_and(|r| !r.is_empty())
    }

    fn write_context(&self, context: &mut Map<String, Value>) {
        context.insert("Replicas".into(), Value::from(self.replicas));
        context.insert("Tls".into(), Value::from(self.tls));
        context.insert("Hostname".into(), Value::from(self.hostname.clone()));
        context.insert("Routes".into(), Value::from(self.routes.clone()));
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Settings of the in-cluster image registry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrySettings {
    pub replicas: Option<u32>,
    pub storage_size: Option<String>,
    pub tls: Option<bool>,
}

impl KindSettings for RegistrySettings {
    const KIND: ComponentKind = ComponentKind::Registry;

    fn complete(&mut self, table: &DefaultsTable) {
        let d = &table.registry;
        fill(&mut self.replicas, d.replicas);
        fill_str(
            &mut self.storage_size,
            or_builtin(&d.storage_size, primitives::REGISTRY_STORAGE_SIZE),
        );
        fill(&mut self.tls, d.tls);
    }

    fn is_complete(&self) -> bool {
        self.replicas.is_some() && str_set(&self.storage_size) && self.tls.is_some()
    }

    fn write_context(&self, context: &mut Map<String, Value>) {
        context.insert("Replicas".into(), Value::from(self.replicas));
        context.insert("StorageSize".into(), Value::from(self.storage_size.clone()));
        context.insert("Tls".into(), Value::from(self.tls));
    }
}

// =============================================================================
// TAGGED UNION
// =============================================================================

/// Settings of a component, tagged by kind.
///
/// In configuration files the tag is the `kind` key:
///
/// ```toml
/// [components.settings]
/// kind = "console"
/// replicas = 3
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComponentSettings {
    Monitoring(MonitoringSettings),
    Console(ConsoleSettings),
    Gateway(GatewaySettings),
    Registry(RegistrySettings),
}

impl ComponentSettings {
    /// Empty settings for a kind (every field unset).
    #[must_use]
    pub fn empty(kind: ComponentKind) -> Self {
        match kind {
            ComponentKind::Monitoring => Self::Monitoring(MonitoringSettings::default()),
            ComponentKind::Console => Self::Console(ConsoleSettings::default()),
            ComponentKind::Gateway => Self::Gateway(GatewaySettings::default()),
            ComponentKind::Registry => Self::Registry(RegistrySettings::default()),
        }
    }

    /// The kind of these settings.
    #[must_use]
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Monitoring(_) => MonitoringSettings::KIND,
            Self::Console(_) => ConsoleSettings::KIND,
            Self::Gateway(_) => GatewaySettings::KIND,
            Self::Registry(_) => RegistrySettings::KIND,
        }
    }

    /// Fill every unset field from the defaults table.
    pub fn complete(&mut self, table: &DefaultsTable) {
        match self {
            Self::Monitoring(s) => s.complete(table),
            Self::Console(s) => s.complete(table),
            Self::Gateway(s) => s.complete(table),
            Self::Registry(s) => s.complete(table),
        }
    }

    /// Whether every field holds a value.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        match self {
            Self::Monitoring(s) => s.is_complete(),
            Self::Console(s) => s.is_complete(),
            Self::Gateway(s) => s.is_complete(),
            Self::Registry(s) => s.is_complete(),
        }
    }

    /// Write the render context fields for templates.
    pub fn write_context(&self, context: &mut Map<String, Value>) {
        match self {
            Self::Monitoring(s) => s.write_context(context),
            Self::Console(s) => s.write_context(context),
            Self::Gateway(s) => s.write_context(context),
            Self::Registry(s) => s.write_context(context),
        }
    }

    /// Replica count, if set. Every kind has one.
    #[must_use]
    pub fn replicas(&self) -> Option<u32> {
        match self {
            Self::Monitoring(s) => s.replicas,
            Self::Console(s) => s.replicas,
            Self::Gateway(s) => s.replicas,
            Self::Registry(s) => s.replicas,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
