//! # Pipeline Module
//!
//! Drives every registered component through its lifecycle:
//!
//! ```text
//! Constructed -> Completed -> Validated -> Authorized -> Rendered
//!                    |             |            |             \-> RenderFailed
//!                    |             |            \-> Rejected (unauthorized)
//!                    |             \-> Unmet dependencies
//!                    \-> Disabled (skipped)
//! ```
//!
//! Completion runs over the whole registry before anything renders, so a
//! dependency's namespace is final by the time a dependent reads it. The
//! evaluation phase then only borrows the registry, which freezes
//! enablement for the rest of the run. Components are evaluated on the
//! rayon pool, but reports always come back in dependency order.
//!
//! Every report carries the states its component passed through, from
//! `Constructed` to the terminal state of its outcome.
//!
//! There are no retries. Unmet dependencies and missing grants are
//! reported as outcomes; the caller decides what to do next.

use crate::completion::{Completion, DefaultsTable};
use crate::descriptor::{Component, ComponentDescriptor};
use crate::license::{GrantedFeatures, LicenseGate};
use crate::manifest::{Manifest, TemplateSource};
use crate::registry::Registry;
use crate::template::TemplateError;
use crate::types::{ComponentKind, LicenseTag, StevedoreError};
use crate::validator::DependencyValidator;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

// =============================================================================
// LIFECYCLE
// =============================================================================

/// Lifecycle states of a component within one installer run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Constructed,
    Completed,
    Validated,
    Authorized,
    /// Terminal: manifest produced.
    Rendered,
    /// Terminal: disabled components are skipped.
    Disabled,
    /// Terminal: at least one dependency is absent or disabled.
    Unmet,
    /// Terminal: license tag not granted.
    Rejected,
    /// Terminal: the template failed to render.
    RenderFailed,
}

impl LifecycleState {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Constructed => "constructed",
            LifecycleState::Completed => "completed",
            LifecycleState::Validated => "validated",
            LifecycleState::Authorized => "authorized",
            LifecycleState::Rendered => "rendered",
            LifecycleState::Disabled => "disabled",
            LifecycleState::Unmet => "unmet",
            LifecycleState::Rejected => "rejected",
            LifecycleState::RenderFailed => "render_failed",
        }
    }

    /// Whether the run stops here for the component.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LifecycleState::Rendered
                | LifecycleState::Disabled
                | LifecycleState::Unmet
                | LifecycleState::Rejected
                | LifecycleState::RenderFailed
        )
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// OUTCOMES
// =============================================================================

/// Where a component ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Disabled,
    UnmetDependencies(Vec<String>),
    Unauthorized(LicenseTag),
    RenderFailed(TemplateError),
    Rendered(Manifest),
}

impl Outcome {
    /// The terminal lifecycle state of this outcome.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        match self {
            Outcome::Disabled => LifecycleState::Disabled,
            Outcome::UnmetDependencies(_) => LifecycleState::Unmet,
            Outcome::Unauthorized(_) => LifecycleState::Rejected,
            Outcome::RenderFailed(_) => LifecycleState::RenderFailed,
            Outcome::Rendered(_) => LifecycleState::Rendered,
        }
    }

    #[must_use]
    pub fn manifest(&self) -> Option<&Manifest> {
        match self {
            Outcome::Rendered(manifest) => Some(manifest),
            _ => None,
        }
    }

    /// Human-readable explanation of a non-rendered outcome.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        match self {
            Outcome::Disabled => Some("component is disabled".to_string()),
            Outcome::UnmetDependencies(unmet) => {
                Some(format!("unmet dependencies: {}", unmet.join(", ")))
            }
            Outcome::Unauthorized(tag) => Some(format!("license feature '{}' not granted", tag)),
            Outcome::RenderFailed(error) => Some(error.to_string()),
            Outcome::Rendered(_) => None,
        }
    }
}

/// Outcome of one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentReport {
    pub component: String,
    pub kind: ComponentKind,
    /// States passed through, in order; the last is `outcome.state()`.
    pub states: Vec<LifecycleState>,
    pub outcome: Outcome,
}

impl ComponentReport {
    /// Whether the component passed through `state` during the run.
    #[must_use]
    pub fn reached(&self, state: LifecycleState) -> bool {
        self.states.contains(&state)
    }
}

/// Outcome counts of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub rendered: usize,
    pub disabled: usize,
    pub unmet: usize,
    pub rejected: usize,
    pub failed: usize,
}

/// Per-component outcomes of a run, in dependency order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunReport {
    reports: Vec<ComponentReport>,
}

impl RunReport {
    #[must_use]
    pub fn outcomes(&self) -> &[ComponentReport] {
        &self.reports
    }

    /// Report of a single component.
    #[must_use]
    pub fn get(&self, component: &str) -> Option<&ComponentReport> {
        self.reports.iter().find(|r| r.component == component)
    }

    /// Manifests of the components that reached `Rendered`. Nothing else
    /// should ever be applied.
    pub fn manifests(&self) -> impl Iterator<Item = &Manifest> {
        self.reports.iter().filter_map(|r| r.outcome.manifest())
    }

    /// Whether every component that was not skipped got rendered.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.reports.iter().all(|r| {
            matches!(r.outcome.state(), LifecycleState::Rendered | LifecycleState::Disabled)
        })
    }

    #[must_use]
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        for report in &self.reports {
            let slot = match report.outcome.state() {
                LifecycleState::Rendered => &mut summary.rendered,
                LifecycleState::Disabled => &mut summary.disabled,
                LifecycleState::Unmet => &mut summary.unmet,
                LifecycleState::Rejected => &mut summary.rejected,
                _ => &mut summary.failed,
            };
            *slot = slot.saturating_add(1);
        }
        summary
    }
}

// =============================================================================
// PIPELINE
// =============================================================================

/// Pipeline knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Report disabled components as `Disabled` without checking them.
    /// When off, disabled components go through validation and rendering
    /// like any other (dry-run).
    pub skip_disabled: bool,
    /// Evaluate components on the rayon pool.
    pub parallel: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            skip_disabled: true,
            parallel: true,
        }
    }
}

/// The installer pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline {
    defaults: DefaultsTable,
    granted: GrantedFeatures,
    options: PipelineOptions,
}

impl Pipeline {
    #[must_use]
    pub fn new(defaults: DefaultsTable, granted: GrantedFeatures) -> Self {
        Self {
            defaults,
            granted,
            options: PipelineOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn defaults(&self) -> &DefaultsTable {
        &self.defaults
    }

    #[must_use]
    pub fn granted(&self) -> &GrantedFeatures {
        &self.granted
    }

    /// Complete every component, then evaluate them all.
    pub fn run<T: TemplateSource>(&self, registry: &mut Registry, templates: &T) -> RunReport {
        registry.complete_all(&self.defaults);
        tracing::debug!(components = registry.len(), "completion finished");
        self.evaluate(registry, templates)
    }

    /// Evaluate every component of an already completed registry.
    pub fn evaluate<T: TemplateSource>(&self, registry: &Registry, templates: &T) -> RunReport {
        let order = registry.dependency_order();

        let reports: Vec<Option<ComponentReport>> = if self.options.parallel {
            order
                .par_iter()
                .map(|id| registry.get(*id).map(|d| self.report(registry, d, templates)))
                .collect()
        } else {
            order
                .iter()
                .map(|id| registry.get(*id).map(|d| self.report(registry, d, templates)))
                .collect()
        };

        let report = RunReport {
            reports: reports.into_iter().flatten().collect(),
        };
        let summary = report.summary();
        tracing::info!(
            rendered = summary.rendered,
            disabled = summary.disabled,
            unmet = summary.unmet,
            rejected = summary.rejected,
            failed = summary.failed,
            "pipeline run finished"
        );
        report
    }

    /// Evaluate a single component of an already completed registry.
    pub fn evaluate_one<T: TemplateSource>(
        &self,
        registry: &Registry,
        name: &str,
        templates: &T,
    ) -> Result<ComponentReport, StevedoreError> {
        let descriptor = registry
            .get_by_name(name)
            .ok_or_else(|| StevedoreError::ComponentNotFound(name.to_string()))?;
        Ok(self.report(registry, descriptor, templates))
    }

    fn report<T: TemplateSource>(
        &self,
        registry: &Registry,
        descriptor: &ComponentDescriptor,
        templates: &T,
    ) -> ComponentReport {
        let mut states = Vec::new();
        let outcome = self.process(registry, descriptor, templates, &mut states);
        enter(&mut states, descriptor.name(), outcome.state());
        ComponentReport {
            component: descriptor.name.clone(),
            kind: descriptor.kind(),
            states,
            outcome,
        }
    }

    fn process<T: TemplateSource>(
        &self,
        registry: &Registry,
        descriptor: &ComponentDescriptor,
        templates: &T,
        states: &mut Vec<LifecycleState>,
    ) -> Outcome {
        let name = descriptor.name();

        enter(states, name, LifecycleState::Constructed);
        if Completion::is_complete(descriptor) {
            enter(states, name, LifecycleState::Completed);
        }

        if !descriptor.is_enabled() && self.options.skip_disabled {
            return Outcome::Disabled;
        }

        let dependencies = DependencyValidator::check(registry, descriptor);
        if !dependencies.is_satisfied() {
            tracing::info!(component = %name, unmet = ?dependencies.unmet(), "unmet dependencies");
            return Outcome::UnmetDependencies(dependencies.unmet);
        }
        enter(states, name, LifecycleState::Validated);

        if !LicenseGate::authorize(descriptor, &self.granted) {
            let tag = descriptor.license_tag().clone();
            tracing::info!(component = %name, license = %tag, "license feature not granted");
            return Outcome::Unauthorized(tag);
        }
        enter(states, name, LifecycleState::Authorized);

        let template = templates.template_for(descriptor);
        match descriptor.render(&template, registry) {
            Ok(manifest) => {
                tracing::debug!(component = %name, bytes = manifest.text.len(), "rendered");
                Outcome::Rendered(manifest)
            }
            Err(error) => {
                tracing::error!(component = %name, error = %error, "render failed");
                Outcome::RenderFailed(error)
            }
        }
    }
}

fn enter(states: &mut Vec<LifecycleState>, component: &str, state: LifecycleState) {
    tracing::debug!(component = %component, state = %state, "lifecycle transition");
    states.push(state);
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{BuiltinTemplates, TemplateOverrides};

    fn all_granted() -> GrantedFeatures {
        ComponentKind::ALL.iter().map(|k| k.as_str()).collect()
    }

    fn stack() -> Registry {
        Registry::from_descriptors([
            ComponentDescriptor::new("console", ComponentKind::Console)
                .depends_on("gateway")
                .depends_on("monitoring"),
            ComponentDescriptor::new("gateway", ComponentKind::Gateway),
            ComponentDescriptor::new("monitoring", ComponentKind::Monitoring),
            ComponentDescriptor::new("registry", ComponentKind::Registry).disabled(),
        ])
        .expect("stack")
    }

    fn states(report: &RunReport) -> Vec<(String, LifecycleState)> {
        report
            .outcomes()
            .iter()
            .map(|r| (r.component.clone(), r.outcome.state()))
            .collect()
    }

    #[test]
    fn full_stack_renders_in_dependency_order() {
        let mut registry = stack();
        let pipeline = Pipeline::new(DefaultsTable::default(), all_granted());
        let report = pipeline.run(&mut registry, &BuiltinTemplates);

        assert_eq!(
            states(&report),
            vec![
                ("gateway".to_string(), LifecycleState::Rendered),
                ("monitoring".to_string(), LifecycleState::Rendered),
                ("console".to_string(), LifecycleState::Rendered),
                ("registry".to_string(), LifecycleState::Disabled),
            ]
        );
        assert!(report.is_clean());
        assert_eq!(report.manifests().count(), 3);
    }

    #[test]
    fn reports_record_lifecycle_path() {
        let mut registry = stack();
        registry.set_enabled("monitoring", false).expect("disable");
        let report = Pipeline::new(DefaultsTable::default(), all_granted()).run(&mut registry, &BuiltinTemplates);

        let gateway = report.get("gateway").expect("gateway");
        assert_eq!(
            gateway.states,
            vec![
                LifecycleState::Constructed,
                LifecycleState::Completed,
                LifecycleState::Validated,
                LifecycleState::Authorized,
                LifecycleState::Rendered,
            ]
        );

        let console = report.get("console").expect("console");
        assert_eq!(console.states.last(), Some(&LifecycleState::Unmet));
        assert!(console.reached(LifecycleState::Completed));
        assert!(!console.reached(LifecycleState::Validated));

        let registry_report = report.get("registry").expect("registry");
        assert_eq!(
            registry_report.states,
            vec![
                LifecycleState::Constructed,
                LifecycleState::Completed,
                LifecycleState::Disabled,
            ]
        );
    }

    #[test]
    fn uncompleted_registry_skips_completed_state() {
        let registry = stack();
        let report = Pipeline::new(DefaultsTable::default(), all_granted())
            .evaluate(&registry, &BuiltinTemplates);

        let gateway = report.get("gateway").expect("gateway");
        assert_eq!(gateway.states.first(), Some(&LifecycleState::Constructed));
        assert!(!gateway.reached(LifecycleState::Completed));
    }

    #[test]
    fn disabled_dependency_stops_dependent() {
        let mut registry = stack();
        registry.set_enabled("gateway", false).expect("disable");

        let pipeline = Pipeline::new(DefaultsTable::default(), all_granted());
        let report = pipeline.run(&mut registry, &BuiltinTemplates);

        let console = report.get("console").expect("console");
        assert_eq!(
            console.outcome,
            Outcome::UnmetDependencies(vec!["gateway".to_string()])
        );
        assert!(!report.is_clean());
        assert!(report.manifests().all(|m| m.component != "console"));
    }

    #[test]
    fn missing_grant_rejects() {
        let mut registry = stack();
        let granted: GrantedFeatures = ["gateway", "monitoring"].into_iter().collect();
        let report = Pipeline::new(DefaultsTable::default(), granted).run(&mut registry, &BuiltinTemplates);

        let console = report.get("console").expect("console");
        assert_eq!(console.outcome.state(), LifecycleState::Rejected);
        assert_eq!(report.summary().rejected, 1);
    }

    #[test]
    fn broken_template_fails_only_that_component() {
        let mut registry = stack();
        let mut templates = TemplateOverrides::new();
        templates.insert("gateway", "{{ .DoesNotExist }}");

        let report =
            Pipeline::new(DefaultsTable::default(), all_granted()).run(&mut registry, &templates);

        assert_eq!(
            report.get("gateway").map(|r| r.outcome.state()),
            Some(LifecycleState::RenderFailed)
        );
        assert_eq!(
            report.get("monitoring").map(|r| r.outcome.state()),
            Some(LifecycleState::Rendered)
        );
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let pipeline = Pipeline::new(DefaultsTable::default(), all_granted());
        let sequential = pipeline.clone().with_options(PipelineOptions {
            skip_disabled: true,
            parallel: false,
        });

        let a = pipeline.run(&mut stack(), &BuiltinTemplates);
        let b = sequential.run(&mut stack(), &BuiltinTemplates);
        assert_eq!(a, b);
    }

    #[test]
    fn dry_run_checks_disabled_components() {
        let mut registry = stack();
        let pipeline = Pipeline::new(DefaultsTable::default(), all_granted()).with_options(
            PipelineOptions {
                skip_disabled: false,
                parallel: false,
            },
        );
        let report = pipeline.run(&mut registry, &BuiltinTemplates);
        assert_eq!(
            report.get("registry").map(|r| r.outcome.state()),
            Some(LifecycleState::Rendered)
        );
    }

    #[test]
    fn evaluate_one_unknown_component() {
        let registry = stack();
        let pipeline = Pipeline::new(DefaultsTable::default(), all_granted());
        let result = pipeline.evaluate_one(&registry, "ghost", &BuiltinTemplates);
        assert!(matches!(result, Err(StevedoreError::ComponentNotFound(_))));
    }

    #[test]
    fn terminal_states() {
        assert!(LifecycleState::Rendered.is_terminal());
        assert!(LifecycleState::Unmet.is_terminal());
        assert!(!LifecycleState::Completed.is_terminal());
        assert_eq!(LifecycleState::RenderFailed.to_string(), "render_failed");
    }
}
