//! # Component Descriptor
//!
//! The data every deployable unit carries, and the [`Component`] trait that
//! exposes the plugin operations the pipeline relies on.

use crate::manifest::{Manifest, ManifestContext};
use crate::registry::Registry;
use crate::settings::ComponentSettings;
use crate::template::{self, TemplateError};
use crate::types::{ComponentKind, LicenseTag, Status};
use serde::{Deserialize, Serialize};

// =============================================================================
// COMPONENT TRAIT
// =============================================================================

/// The plugin protocol of a deployable component.
///
/// The pipeline only ever talks to components through this trait.
pub trait Component {
    /// Stable identifier, unique within a registry.
    fn name(&self) -> &str;

    /// Whether the component takes part in this installer run.
    fn is_enabled(&self) -> bool;

    /// Declared dependencies, by name, in declaration order.
    fn dependencies(&self) -> &[String];

    /// Last observed deployment status.
    fn status(&self) -> &Status;

    /// License feature required to deploy the component.
    fn license_tag(&self) -> &LicenseTag;

    /// Render the component's manifest from a template source.
    ///
    /// `registry` supplies the namespaces of dependencies to the template.
    fn render(&self, template: &str, registry: &Registry) -> Result<Manifest, TemplateError>;
}

// =============================================================================
// DESCRIPTOR
// =============================================================================

fn default_enabled() -> bool {
    true
}

/// Configuration and state of one deployable unit.
///
/// Constructed with any subset of fields set; [`Completion`](crate::Completion)
/// fills the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Target namespace. Empty until completed.
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub status: Status,
    /// Names of required components, in declaration order, without duplicates.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Empty until completed.
    #[serde(default)]
    pub license_tag: LicenseTag,
    pub settings: ComponentSettings,
}

impl ComponentDescriptor {
    /// Create an enabled descriptor with every optional field unset.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ComponentKind) -> Self {
        Self::with_settings(name, ComponentSettings::empty(kind))
    }

    /// Create an enabled descriptor with explicit settings.
    #[must_use]
    pub fn with_settings(name: impl Into<String>, settings: ComponentSettings) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            namespace: String::new(),
            status: Status::default(),
            dependencies: Vec::new(),
            license_tag: LicenseTag::default(),
            settings,
        }
    }

    /// The component's kind.
    #[must_use]
    pub fn kind(&self) -> ComponentKind {
        self.settings.kind()
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    #[must_use]
    pub fn with_license_tag(mut self, tag: impl Into<String>) -> Self {
        self.license_tag = LicenseTag::new(tag);
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Status::new(status);
        self
    }

    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn disabled(self) -> Self {
        self.with_enabled(false)
    }

    /// Declare a dependency. Declaring the same name twice is a no-op.
    #[must_use]
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.add_dependency(name);
        self
    }

    /// Declare a dependency in place. Returns `false` if it was already declared.
    pub fn add_dependency(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.dependencies.contains(&name) {
            return false;
        }
        self.dependencies.push(name);
        true
    }
}

impl Component for ComponentDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    fn status(&self) -> &Status {
        &self.status
    }

    fn license_tag(&self) -> &LicenseTag {
        &self.license_tag
    }

    fn render(&self, template: &str, registry: &Registry) -> Result<Manifest, TemplateError> {
        let context = ManifestContext::build(self, registry);
        let text = template::render_value(template, context.as_value())?;
        Ok(Manifest::new(&self.name, &self.namespace, text))
    }
}

// =============================================================================
// TESTS
// =============================================================================
