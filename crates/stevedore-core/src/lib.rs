//! # stevedore-core
//!
//! The deterministic component pipeline for Stevedore - THE PIPELINE.
//!
//! This crate turns declaratively configured components (monitoring stack,
//! console, platform gateway, image registry) into rendered Kubernetes
//! manifest text, after checking dependencies and license grants.
//!
//! ## Pipeline
//!
//! ```text
//! ComponentDescriptor -> Completion -> DependencyValidator -> LicenseGate -> template::render
//! ```
//!
//! [`Pipeline`] runs the whole sequence over a [`Registry`] and reports, per
//! component, which lifecycle state it reached.
//!
//! ## Architectural Constraints
//!
//! - NO async, NO network, NO file I/O (pure Rust)
//! - Deterministic: same configuration, same manifests, byte for byte
//! - Closed set of component kinds, known at compile time
//! - Never applies anything: callers own what happens to rendered text

// =============================================================================
// MODULES
// =============================================================================

pub mod completion;
pub mod descriptor;
pub mod license;
pub mod manifest;
pub mod pipeline;
pub mod primitives;
pub mod registry;
pub mod settings;
pub mod template;
pub mod types;
pub mod validator;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{ComponentId, ComponentKind, LicenseTag, Status, StevedoreError};

// =============================================================================
// RE-EXPORTS: Components
// =============================================================================

pub use descriptor::{Component, ComponentDescriptor};
pub use registry::Registry;
pub use settings::{
    ComponentSettings, ConsoleSettings, GatewaySettings, KindSettings, MonitoringSettings,
    RegistrySettings,
};

// =============================================================================
// RE-EXPORTS: Pipeline stages
// =============================================================================

pub use completion::{Completion, DefaultsTable};
pub use license::{GrantedFeatures, LicenseGate};
pub use manifest::{BuiltinTemplates, Manifest, ManifestContext, TemplateOverrides, TemplateSource};
pub use pipeline::{
    ComponentReport, LifecycleState, Outcome, Pipeline, PipelineOptions, RunReport, RunSummary,
};
pub use template::{Template, TemplateError, render, render_value};
pub use validator::{DependencyReport, DependencyValidator};
