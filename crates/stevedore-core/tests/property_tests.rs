//! # Property-Based Tests
//!
//! Determinism and correctness invariants of the pipeline stages, checked
//! with proptest.

use proptest::collection::{btree_set, vec};
use proptest::prelude::*;
use serde_json::json;
use stevedore_core::{
    Completion, ComponentDescriptor, ComponentKind, DefaultsTable, DependencyValidator,
    GrantedFeatures, LicenseGate, Registry, render_value,
};

fn kind_strategy() -> impl Strategy<Value = ComponentKind> {
    prop_oneof![
        Just(ComponentKind::Monitoring),
        Just(ComponentKind::Console),
        Just(ComponentKind::Gateway),
        Just(ComponentKind::Registry),
    ]
}

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z]([a-z0-9-]{0,11}[a-z0-9])?"
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Completing a completed descriptor changes nothing.
    #[test]
    fn completion_is_idempotent(
        kind in kind_strategy(),
        namespace in prop::option::of("[a-z-]{0,10}"),
        tag in prop::option::of("[a-z]{0,8}"),
    ) {
        let table = DefaultsTable::default();
        let mut descriptor = ComponentDescriptor::new("component", kind);
        if let Some(namespace) = namespace {
            descriptor = descriptor.with_namespace(namespace);
        }
        if let Some(tag) = tag {
            descriptor = descriptor.with_license_tag(tag);
        }

        let once = Completion::completed(descriptor, &table);
        let twice = Completion::completed(once.clone(), &table);

        prop_assert!(Completion::is_complete(&once));
        prop_assert!(!once.namespace.is_empty());
        prop_assert_eq!(once, twice);
    }

    /// Explicit values survive completion.
    #[test]
    fn completion_keeps_explicit_namespace(kind in kind_strategy(), namespace in "[a-z]{1,10}") {
        let completed = Completion::completed(
            ComponentDescriptor::new("component", kind).with_namespace(namespace.clone()),
            &DefaultsTable::default(),
        );
        prop_assert_eq!(completed.namespace, namespace);
    }

    /// Same template and same data give the same bytes.
    #[test]
    fn render_is_deterministic(
        namespace in "[a-zA-Z0-9 _-]{0,20}",
        routes in vec("/[a-z]{0,6}", 0..5),
    ) {
        let data = json!({"Namespace": namespace, "Routes": routes});
        let source = "ns: {{ .Namespace }}\n{{ range .Routes }}- {{ . }}\n{{ else }}none\n{{ end }}";

        let first = render_value(source, &data).expect("render");
        let second = render_value(source, &data).expect("render");
        prop_assert_eq!(first, second);
    }

    /// The validator reports exactly the absent or disabled dependencies, in
    /// declaration order.
    #[test]
    fn validator_reports_exactly_unmet(
        names in btree_set(name_strategy(), 1..8),
        disabled_mask in vec(any::<bool>(), 8),
        absent in btree_set("MISSING[0-9]{1,3}", 0..3),
    ) {
        let mut registry = Registry::new();
        let mut expected = Vec::new();
        let mut dependent = ComponentDescriptor::new("dependent-root", ComponentKind::Console);

        for (i, name) in names.iter().enumerate() {
            let enabled = !disabled_mask.get(i).copied().unwrap_or(false);
            registry
                .register(ComponentDescriptor::new(name.clone(), ComponentKind::Gateway).with_enabled(enabled))
                .expect("register");
            dependent = dependent.depends_on(name.clone());
            if !enabled {
                expected.push(name.clone());
            }
        }
        for name in &absent {
            dependent = dependent.depends_on(name.clone());
            expected.push(name.clone());
        }

        let (ok, unmet) = DependencyValidator::check(&registry, &dependent).into_parts();
        prop_assert_eq!(ok, expected.is_empty());
        prop_assert_eq!(unmet, expected);
    }

    /// Authorization depends only on the tag and the granted set.
    #[test]
    fn authorization_ignores_other_fields(
        tag in "[a-z]{1,8}",
        granted in btree_set("[a-z]{1,8}", 0..5),
        enabled in any::<bool>(),
        namespace in "[a-z]{0,8}",
        kind in kind_strategy(),
    ) {
        let granted: GrantedFeatures = granted.into_iter().collect();
        let a = ComponentDescriptor::new("a", ComponentKind::Console).with_license_tag(tag.clone());
        let b = ComponentDescriptor::new("b", kind)
            .with_license_tag(tag.clone())
            .with_enabled(enabled)
            .with_namespace(namespace)
            .depends_on("a");

        prop_assert_eq!(LicenseGate::authorize(&a, &granted), LicenseGate::authorize(&b, &granted));
        prop_assert_eq!(LicenseGate::authorize(&a, &granted), granted.iter().any(|t| t.as_str() == tag));
    }

    /// Dependency order always places a dependency before its dependents.
    #[test]
    fn dependency_order_respects_edges(names in btree_set(name_strategy(), 1..10)) {
        let names: Vec<String> = names.into_iter().collect();
        let mut registry = Registry::new();
        // Each component depends on the one registered before it; never cyclic.
        for (i, name) in names.iter().enumerate() {
            let mut descriptor = ComponentDescriptor::new(name.clone(), ComponentKind::Gateway);
            if i > 0 {
                descriptor = descriptor.depends_on(names[i - 1].clone());
            }
            registry.register(descriptor).expect("register");
        }

        let order: Vec<&str> = registry
            .dependency_order()
            .into_iter()
            .filter_map(|id| registry.get(id).map(|d| d.name.as_str()))
            .collect();
        let expected: Vec<&str> = names.iter().map(String::as_str).collect();
        prop_assert_eq!(order, expected);
    }
}
