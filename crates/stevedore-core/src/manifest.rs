//! # Manifest Module
//!
//! Render contexts, template sources and rendered manifests.
//!
//! The core hands template text and a context to the renderer and gets text
//! back. It never parses or validates the text as YAML.

use crate::descriptor::{Component, ComponentDescriptor};
use crate::registry::Registry;
use crate::types::ComponentKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::BTreeMap;

// =============================================================================
// RENDER CONTEXT
// =============================================================================

/// The data a component's template sees.
///
/// Keys are PascalCase: `Name`, `Kind`, `Namespace`, `Enabled`, `Status`,
/// `LicenseTag`, the kind's settings (`Replicas`, `Tls`, ...), and
/// `Dependencies`, a map from dependency name to its `Name`, `Namespace`
/// and `Enabled`. Dependencies that are not registered are left out.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestContext(Value);

impl ManifestContext {
    /// Build the context of a component.
    #[must_use]
    pub fn build(descriptor: &ComponentDescriptor, registry: &Registry) -> Self {
        let mut context = Map::new();
        context.insert("Name".into(), Value::from(descriptor.name.as_str()));
        context.insert("Kind".into(), Value::from(descriptor.kind().as_str()));
        context.insert("Namespace".into(), Value::from(descriptor.namespace.as_str()));
        context.insert("Enabled".into(), Value::from(descriptor.enabled));
        context.insert("Status".into(), Value::from(descriptor.status.as_str()));
        context.insert(
            "LicenseTag".into(),
            Value::from(descriptor.license_tag.as_str()),
        );
        descriptor.settings.write_context(&mut context);

        let mut dependencies = Map::new();
        for name in descriptor.dependencies() {
            if let Some(dep) = registry.get_by_name(name) {
                let mut entry = Map::new();
                entry.insert("Name".into(), Value::from(dep.name.as_str()));
                entry.insert("Namespace".into(), Value::from(dep.namespace.as_str()));
                entry.insert("Enabled".into(), Value::from(dep.enabled));
                dependencies.insert(name.clone(), Value::Object(entry));
            }
        }
        context.insert("Dependencies".into(), Value::Object(dependencies));

        Self(Value::Object(context))
    }

    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

// =============================================================================
// RENDERED MANIFEST
// =============================================================================

/// Rendered manifest text of one component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub component: String,
    pub namespace: String,
    pub text: String,
}

impl Manifest {
    #[must_use]
    pub fn new(component: &str, namespace: &str, text: String) -> Self {
        Self {
            component: component.to_string(),
            namespace: namespace.to_string(),
            text,
        }
    }

    /// Conventional file name for the manifest (`<component>.yaml`).
    #[must_use]
    pub fn file_name(&self) -> String {
        Self::file_name_for(&self.component)
    }

    /// File name the manifest of `component` is written under.
    #[must_use]
    pub fn file_name_for(component: &str) -> String {
        format!("{}.yaml", component)
    }

    /// BLAKE3 digest of the text, as lowercase hex.
    ///
    /// Equal configuration must give equal digests across installer runs.
    #[cfg(feature = "manifest-digest")]
    #[must_use]
    pub fn digest(&self) -> String {
        blake3::hash(self.text.as_bytes()).to_hex().to_string()
    }
}

// =============================================================================
// TEMPLATE SOURCES
// =============================================================================

/// Supplies the template text for a component.
///
/// Implementors must be `Send + Sync`: the pipeline asks for templates from
/// worker threads.
pub trait TemplateSource: Send + Sync {
    fn template_for(&self, descriptor: &ComponentDescriptor) -> Cow<'_, str>;
}

const MONITORING_TEMPLATE: &str = include_str!("../manifests/monitoring.yaml.tmpl");
const CONSOLE_TEMPLATE: &str = include_str!("../manifests/console.yaml.tmpl");
const GATEWAY_TEMPLATE: &str = include_str!("../manifests/gateway.yaml.tmpl");
const REGISTRY_TEMPLATE: &str = include_str!("../manifests/registry.yaml.tmpl");

/// The templates compiled into the crate, one per kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTemplates;

impl BuiltinTemplates {
    #[must_use]
    pub fn for_kind(kind: ComponentKind) -> &'static str {
        match kind {
            ComponentKind::Monitoring => MONITORING_TEMPLATE,
            ComponentKind::Console => CONSOLE_TEMPLATE,
            ComponentKind::Gateway => GATEWAY_TEMPLATE,
            ComponentKind::Registry => REGISTRY_TEMPLATE,
        }
    }
}

impl TemplateSource for BuiltinTemplates {
    fn template_for(&self, descriptor: &ComponentDescriptor) -> Cow<'_, str> {
        Cow::Borrowed(Self::for_kind(descriptor.kind()))
    }
}

/// Per-component template text, falling back to the built-in templates.
#[derive(Debug, Clone, Default)]
pub struct TemplateOverrides {
    by_component: BTreeMap<String, String>,
}

impl TemplateOverrides {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `source` for the named component. Returns the replaced source, if any.
    pub fn insert(&mut self, component: impl Into<String>, source: impl Into<String>) -> Option<String> {
        self.by_component.insert(component.into(), source.into())
    }

    #[must_use]
    pub fn is_overridden(&self, component: &str) -> bool {
        self.by_component.contains_key(component)
    }
}

impl TemplateSource for TemplateOverrides {
    fn template_for(&self, descriptor: &ComponentDescriptor) -> Cow<'_, str> {
        match self.by_component.get(&descriptor.name) {
            Some(source) => Cow::Borrowed(source.as_str()),
            None => BuiltinTemplates.template_for(descriptor),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::DefaultsTable;

    fn completed_registry() -> Registry {
        let mut registry = Registry::new();
        registry
            .register(ComponentDescriptor::new("monitoring", ComponentKind::Monitoring))
            .expect("monitoring");
        registry
            .register(ComponentDescriptor::new("gateway", ComponentKind::Gateway))
            .expect("gateway");
        registry
            .register(
                ComponentDescriptor::new("console", ComponentKind::Console)
                    .depends_on("gateway")
                    .depends_on("absent"),
            )
            .expect("console");
        registry.complete_all(&DefaultsTable::default());
        registry
    }

    #[test]
    fn context_exposes_dependency_namespaces() {
        let registry = completed_registry();
        let console = registry.get_by_name("console").expect("console");
        let context = ManifestContext::build(console, &registry);

        let value = context.as_value();
        assert_eq!(value["Namespace"], "caas4-console");
        assert_eq!(value["Dependencies"]["gateway"]["Namespace"], "gap");
        assert!(value["Dependencies"].get("absent").is_none());
    }

    #[test]
    fn every_builtin_template_renders_completed_defaults() {
        let registry = completed_registry();
        for (_, descriptor) in registry.iter() {
            let template = BuiltinTemplates.template_for(descriptor);
            let manifest = descriptor.render(&template, &registry).expect("render");
            assert!(manifest.text.contains(&format!("namespace: {}", descriptor.namespace)));
            assert!(!manifest.text.contains("{{"));
        }
    }

    #[test]
    fn gateway_template_emits_one_path_per_route() {
        let mut registry = Registry::new();
        let mut gateway = ComponentDescriptor::new("gw", ComponentKind::Gateway);
        if let crate::settings::ComponentSettings::Gateway(settings) = &mut gateway.settings {
            settings.routes = Some(vec!["/".to_string(), "/api".to_string()]);
        }
        registry.register(gateway).expect("gw");
        registry.complete_all(&DefaultsTable::default());

        let gw = registry.get_by_name("gw").expect("gw");
        let manifest = gw
            .render(BuiltinTemplates::for_kind(ComponentKind::Gateway), &registry)
            .expect("render");
        assert_eq!(manifest.text.matches("pathType: Prefix").count(), 2);
        assert!(manifest.text.contains("- path: /api"));
    }

    #[test]
    fn overrides_fall_back_to_builtin() {
        let registry = completed_registry();
        let mut overrides = TemplateOverrides::new();
        overrides.insert("console", "custom {{ .Name }}");

        let console = registry.get_by_name("console").expect("console");
        let gateway = registry.get_by_name("gateway").expect("gateway");
        assert_eq!(overrides.template_for(console), "custom {{ .Name }}");
        assert_eq!(
            overrides.template_for(gateway),
            BuiltinTemplates::for_kind(ComponentKind::Gateway)
        );
    }

    #[test]
    fn manifest_file_name() {
        let manifest = Manifest::new("console", "caas4-console", String::new());
        assert_eq!(manifest.file_name(), "console.yaml");
    }

    #[cfg(feature = "manifest-digest")]
    #[test]
    fn digest_is_stable() {
        let a = Manifest::new("c", "ns", "text".to_string());
        let b = Manifest::new("c", "ns", "text".to_string());
        assert_eq!(a.digest(), b.digest());
        assert_eq!(a.digest().len(), 64);
    }
}
