//! # Registry Module
//!
//! Central arena of component descriptors with a by-name index.
//!
//! Dependencies are stored as names and resolved through the index on
//! lookup, so the dependency graph is a lookup structure and never an
//! ownership hierarchy. A dependency naming a component that is not (yet)
//! registered is allowed; the validator reports it as unmet.
//!
//! ## Invariants
//!
//! - Names are unique DNS labels (`[a-z0-9]([-a-z0-9]*[a-z0-9])?`)
//! - Dependency lists hold no duplicates
//! - No component depends on itself
//! - The resolved dependency relation is acyclic
//!
//! Registrations that would break an invariant are rejected and leave the
//! registry unchanged.

use crate::completion::{Completion, DefaultsTable};
use crate::descriptor::{Component, ComponentDescriptor};
use crate::primitives::{MAX_COMPONENTS, MAX_NAME_LENGTH};
use crate::types::{ComponentId, Status, StevedoreError};
use std::collections::{BTreeMap, BTreeSet};

/// Whether `name` is a DNS label: lowercase ASCII alphanumerics and '-',
/// starting and ending with an alphanumeric.
fn is_dns_label(name: &str) -> bool {
    let bytes = name.as_bytes();
    let alnum = |b: &u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    bytes.first().is_some_and(alnum)
        && bytes.last().is_some_and(alnum)
        && bytes.iter().all(|b| alnum(b) || *b == b'-')
}

/// Arena of registered components.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    components: Vec<ComponentDescriptor>,
    index: BTreeMap<String, ComponentId>,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from descriptors, registering them in order.
    pub fn from_descriptors(
        descriptors: impl IntoIterator<Item = ComponentDescriptor>,
    ) -> Result<Self, StevedoreError> {
        let mut registry = Self::new();
        for descriptor in descriptors {
            registry.register(descriptor)?;
        }
        Ok(registry)
    }

    /// Number of registered components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    // =========================================================================
    // REGISTRATION
    // =========================================================================

    /// Register a component.
    ///
    /// Rejects names that are not DNS labels, duplicates, self-dependencies
    /// and any registration that would close a dependency cycle. Repeated
    /// dependency names are collapsed to their first occurrence.
    pub fn register(&mut self, mut descriptor: ComponentDescriptor) -> Result<ComponentId, StevedoreError> {
        let name = descriptor.name.clone();

        if name.is_empty() {
            return Err(StevedoreError::InvalidComponent(
                "component name is empty".to_string(),
            ));
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err(StevedoreError::InvalidComponent(format!(
                "component name '{}' exceeds {} characters",
                name, MAX_NAME_LENGTH
            )));
        }
        if !is_dns_label(&name) {
            return Err(StevedoreError::InvalidComponent(format!(
                "component name '{}' must be lowercase alphanumerics and '-', starting and ending with an alphanumeric",
                name
            )));
        }
        if self.index.contains_key(&name) {
            return Err(StevedoreError::DuplicateComponent(name));
        }
        if descriptor.dependencies.iter().any(|dep| *dep == name) {
            return Err(StevedoreError::SelfDependency(name));
        }
        let mut seen = BTreeSet::new();
        descriptor.dependencies.retain(|dep| seen.insert(dep.clone()));
        if self.components.len() >= MAX_COMPONENTS {
            return Err(StevedoreError::RegistryFull(MAX_COMPONENTS));
        }

        let id = ComponentId(self.components.len());
        self.components.push(descriptor);
        self.index.insert(name.clone(), id);

        // The registry was acyclic before, so any new cycle runs through `id`.
        if let Some(cycle) = self.cycle_through(id) {
            self.components.pop();
            self.index.remove(&name);
            return Err(StevedoreError::DependencyCycle(cycle));
        }

        tracing::debug!(component = %name, id = id.index(), "registered component");
        Ok(id)
    }

    /// Find a dependency path from `start` back to itself, as names.
    fn cycle_through(&self, start: ComponentId) -> Option<Vec<String>> {
        let mut visited = BTreeSet::new();
        let mut path = vec![start];
        if self.walk_back_to(start, start, &mut visited, &mut path) {
            return Some(
                path.iter()
                    .map(|id| self.components[id.index()].name.clone())
                    .collect(),
            );
        }
        None
    }

    fn walk_back_to(
        &self,
        current: ComponentId,
        target: ComponentId,
        visited: &mut BTreeSet<ComponentId>,
        path: &mut Vec<ComponentId>,
    ) -> bool {
        for dep in self.resolved_dependencies(current) {
            if dep == target {
                path.push(dep);
                return true;
            }
            if !visited.insert(dep) {
                continue;
            }
            path.push(dep);
            if self.walk_back_to(dep, target, visited, path) {
                return true;
            }
            path.pop();
        }
        false
    }

    // =========================================================================
    // LOOKUP
    // =========================================================================

    /// Get a component by id.
    #[must_use]
    pub fn get(&self, id: ComponentId) -> Option<&ComponentDescriptor> {
        self.components.get(id.index())
    }

    /// Get a component by name.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&ComponentDescriptor> {
        self.id_of(name).and_then(|id| self.get(id))
    }

    /// Resolve a name to its id.
    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<ComponentId> {
        self.index.get(name).copied()
    }

    /// Whether a component with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterate components in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (ComponentId, &ComponentDescriptor)> {
        self.components
            .iter()
            .enumerate()
            .map(|(i, d)| (ComponentId(i), d))
    }

    /// Ids of the registered dependencies of a component, in declaration order.
    ///
    /// Dangling dependency names are skipped.
    pub fn resolved_dependencies(&self, id: ComponentId) -> impl Iterator<Item = ComponentId> + '_ {
        self.get(id)
            .into_iter()
            .flat_map(|d| d.dependencies().iter())
            .filter_map(|name| self.id_of(name))
    }

    /// Names of the registered components that declare `name` as a dependency.
    #[must_use]
    pub fn dependents_of(&self, name: &str) -> Vec<&str> {
        self.components
            .iter()
            .filter(|d| d.dependencies().iter().any(|dep| dep == name))
            .map(|d| d.name.as_str())
            .collect()
    }

    // =========================================================================
    // MUTATION
    // =========================================================================

    /// Run default completion over every component.
    pub fn complete_all(&mut self, table: &DefaultsTable) {
        for descriptor in &mut self.components {
            Completion::complete(descriptor, table);
        }
    }

    fn get_mut_by_name(&mut self, name: &str) -> Result<&mut ComponentDescriptor, StevedoreError> {
        let id = self
            .id_of(name)
            .ok_or_else(|| StevedoreError::ComponentNotFound(name.to_string()))?;
        self.components
            .get_mut(id.index())
            .ok_or_else(|| StevedoreError::ComponentNotFound(name.to_string()))
    }

    /// Record the observed deployment status of a component.
    pub fn set_status(&mut self, name: &str, status: Status) -> Result<(), StevedoreError> {
        self.get_mut_by_name(name)?.status = status;
        Ok(())
    }

    /// Enable or disable a component.
    ///
    /// Takes `&mut self`, so enablement cannot change while a pipeline run
    /// holds the registry.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<(), StevedoreError> {
        self.get_mut_by_name(name)?.enabled = enabled;
        Ok(())
    }

    /// Transitively enable every registered dependency of a component.
    ///
    /// Returns the names of the components that were switched on, in the
    /// order they were reached. Dangling dependencies cannot be enabled and
    /// stay unmet.
    pub fn enable_dependencies(&mut self, name: &str) -> Result<Vec<String>, StevedoreError> {
        let root = self
            .id_of(name)
            .ok_or_else(|| StevedoreError::ComponentNotFound(name.to_string()))?;

        let mut enabled = Vec::new();
        let mut seen = BTreeSet::from([root]);
        let mut stack: Vec<ComponentId> = self.resolved_dependencies(root).collect();
        stack.reverse();

        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            let mut next: Vec<ComponentId> = self.resolved_dependencies(id).collect();
            next.reverse();
            stack.extend(next);

            if let Some(descriptor) = self.components.get_mut(id.index()) {
                if !descriptor.enabled {
                    descriptor.enabled = true;
                    tracing::info!(component = %descriptor.name, required_by = %name, "auto-enabled dependency");
                    enabled.push(descriptor.name.clone());
                }
            }
        }
        Ok(enabled)
    }

    // =========================================================================
    // ORDERING
    // =========================================================================

    /// All component ids, dependencies before dependents.
    ///
    /// Among components whose dependencies are all placed, the earliest
    /// registered goes first, so the order is fully deterministic.
    #[must_use]
    pub fn dependency_order(&self) -> Vec<ComponentId> {
        let count = self.components.len();
        let mut remaining: Vec<usize> = (0..count)
            .map(|i| self.resolved_dependencies(ComponentId(i)).count())
            .collect();
        let mut dependents: Vec<Vec<ComponentId>> = vec![Vec::new(); count];
        for i in 0..count {
            for dep in self.resolved_dependencies(ComponentId(i)) {
                dependents[dep.index()].push(ComponentId(i));
            }
        }

        let mut ready: BTreeSet<ComponentId> = (0..count)
            .filter(|&i| remaining[i] == 0)
            .map(ComponentId)
            .collect();
        let mut order = Vec::with_capacity(count);

        while let Some(id) = ready.pop_first() {
            order.push(id);
            for &dependent in &dependents[id.index()] {
                let slot = &mut remaining[dependent.index()];
                *slot = slot.saturating_sub(1);
                if *slot == 0 {
                    ready.insert(dependent);
                }
            }
        }
        order
    }
}

// =============================================================================
// TESTS
// =============================================================================
