//! # Installer Configuration
//!
//! Loads the TOML installer configuration and turns it into the inputs of a
//! pipeline run: the registry, the defaults table, the granted license
//! features and per-component template overrides.
//!
//! ```toml
//! [license]
//! features = ["monitoring", "console", "gateway"]
//!
//! [defaults.console]
//! namespace = "caas4-console"
//!
//! [[components]]
//! name = "console"
//! depends_on = ["gateway", "monitoring"]
//! template = "templates/console.yaml.tmpl"
//!
//! [components.settings]
//! kind = "console"
//! replicas = 3
//! ```
//!
//! Template paths are resolved relative to the directory holding the
//! configuration file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use stevedore_core::{
    ComponentDescriptor, ComponentSettings, DefaultsTable, GrantedFeatures, Pipeline,
    PipelineOptions, Registry, StevedoreError, TemplateOverrides,
    primitives::MAX_TEMPLATE_SIZE,
};

// =============================================================================
// LIMITS AND ENVIRONMENT
// =============================================================================

/// Maximum configuration file size (1 MB).
pub const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Environment variable overriding the granted license features.
pub const FEATURES_ENV: &str = "STEVEDORE_FEATURES";

/// Configuration written by `stevedore init`.
pub const SAMPLE_CONFIG: &str = r#"# Stevedore installer configuration

[license]
features = ["monitoring", "console", "gateway"]

[defaults.console]
title = "CaaS Console"

[[components]]
name = "monitoring"

[components.settings]
kind = "monitoring"

[[components]]
name = "gateway"

[components.settings]
kind = "gateway"
routes = ["/", "/api"]

[[components]]
name = "console"
depends_on = ["gateway", "monitoring"]

[components.settings]
kind = "console"
replicas = 2

[[components]]
name = "registry"
enabled = false

[components.settings]
kind = "registry"
"#;

/// Reject files larger than `max_size` before reading them.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), StevedoreError> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        StevedoreError::Io(format!("Cannot read metadata of '{}': {}", path.display(), e))
    })?;

    if metadata.len() > max_size {
        return Err(StevedoreError::Config(format!(
            "File '{}' is {} bytes, maximum allowed is {} bytes",
            path.display(),
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

fn read_bounded(path: &Path, max_size: u64) -> Result<String, StevedoreError> {
    validate_file_size(path, max_size)?;
    std::fs::read_to_string(path)
        .map_err(|e| StevedoreError::Io(format!("Cannot read '{}': {}", path.display(), e)))
}

// =============================================================================
// FILE FORMAT
// =============================================================================

/// The `[license]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LicenseSection {
    pub features: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

/// One `[[components]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentEntry {
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub license_tag: Option<String>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Template file for this component, relative to the configuration file.
    #[serde(default)]
    pub template: Option<PathBuf>,
    pub settings: ComponentSettings,
}

impl ComponentEntry {
    /// The descriptor this entry declares, not yet completed.
    #[must_use]
    pub fn to_descriptor(&self) -> ComponentDescriptor {
        let mut descriptor = ComponentDescriptor::with_settings(self.name.clone(), self.settings.clone())
            .with_enabled(self.enabled);
        if let Some(namespace) = &self.namespace {
            descriptor = descriptor.with_namespace(namespace.clone());
        }
        if let Some(tag) = &self.license_tag {
            descriptor = descriptor.with_license_tag(tag.clone());
        }
        for dependency in &self.depends_on {
            descriptor.add_dependency(dependency.clone());
        }
        descriptor
    }
}

/// The installer configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstallerConfig {
    #[serde(default)]
    pub license: LicenseSection,
    #[serde(default)]
    pub defaults: DefaultsTable,
    #[serde(default)]
    pub components: Vec<ComponentEntry>,
}

impl InstallerConfig {
    /// Parse configuration text.
    ///
    /// Empty entries in the `[defaults]` tables are rejected.
    pub fn from_toml_str(text: &str) -> Result<Self, StevedoreError> {
        let config: Self = toml::from_str(text).map_err(|e| StevedoreError::Config(e.to_string()))?;
        config.defaults.validate()?;
        Ok(config)
    }

    /// Read and parse a configuration file.
    pub fn from_file(path: &Path) -> Result<Self, StevedoreError> {
        let text = read_bounded(path, MAX_CONFIG_FILE_SIZE)?;
        Self::from_toml_str(&text)
            .map_err(|e| StevedoreError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Register every component, in file order.
    pub fn registry(&self) -> Result<Registry, StevedoreError> {
        Registry::from_descriptors(self.components.iter().map(ComponentEntry::to_descriptor))
    }
}

// =============================================================================
// FEATURE RESOLUTION
// =============================================================================

/// Read the feature override from `STEVEDORE_FEATURES`, if set.
pub fn features_from_env() -> Option<String> {
    std::env::var(FEATURES_ENV).ok()
}

/// Pick the granted features: explicit override first, then the
/// environment, then the configuration file.
#[must_use]
pub fn resolve_features(config: &LicenseSection, override_list: Option<&str>) -> GrantedFeatures {
    match override_list.map(str::to_string).or_else(features_from_env) {
        Some(list) => list.parse().unwrap_or_default(),
        None => config.features.iter().cloned().collect(),
    }
}

// =============================================================================
// INSTALLATION
// =============================================================================

/// Everything a pipeline run needs, loaded from one configuration file.
#[derive(Debug, Clone)]
pub struct Installation {
    pub defaults: DefaultsTable,
    pub granted: GrantedFeatures,
    pub registry: Registry,
    pub templates: TemplateOverrides,
}

impl Installation {
    /// Load a configuration file and every template it references.
    pub fn load(path: &Path, features_override: Option<&str>) -> Result<Self, StevedoreError> {
        let config = InstallerConfig::from_file(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_config(config, base_dir, features_override)
    }

    /// Build from parsed configuration, resolving template paths against `base_dir`.
    pub fn from_config(
        config: InstallerConfig,
        base_dir: &Path,
        features_override: Option<&str>,
    ) -> Result<Self, StevedoreError> {
        let registry = config.registry()?;

        let mut templates = TemplateOverrides::new();
        for entry in &config.components {
            if let Some(relative) = &entry.template {
                let path = base_dir.join(relative);
                let source = read_bounded(&path, MAX_TEMPLATE_SIZE as u64)?;
                tracing::debug!(component = %entry.name, template = %path.display(), "loaded template override");
                templates.insert(entry.name.clone(), source);
            }
        }

        let granted = resolve_features(&config.license, features_override);
        tracing::info!(
            components = registry.len(),
            overrides = config.components.iter().filter(|c| c.template.is_some()).count(),
            granted = granted.len(),
            "configuration loaded"
        );

        Ok(Self {
            defaults: config.defaults,
            granted,
            registry,
            templates,
        })
    }

    /// A pipeline over this installation's defaults.
    #[must_use]
    pub fn pipeline(&self, granted: GrantedFeatures, options: PipelineOptions) -> Pipeline {
        Pipeline::new(self.defaults.clone(), granted).with_options(options)
    }

    /// A completed copy of the registry.
    ///
    /// With `auto_enable`, the dependencies of every enabled component are
    /// switched on first; the names switched on are returned alongside.
    pub fn prepared_registry(&self, auto_enable: bool) -> Result<(Registry, Vec<String>), StevedoreError> {
        let mut registry = self.registry.clone();
        let mut switched_on = Vec::new();

        if auto_enable {
            let roots: Vec<String> = registry
                .iter()
                .filter(|(_, d)| d.enabled)
                .map(|(_, d)| d.name.clone())
                .collect();
            for root in roots {
                switched_on.extend(registry.enable_dependencies(&root)?);
            }
        }

        registry.complete_all(&self.defaults);
        Ok((registry, switched_on))
    }
}

// =============================================================================
// TESTS
// =============================================================================
