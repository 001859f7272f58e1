//! # Pipeline Benchmarks
//!
//! Performance benchmarks for template rendering and full pipeline runs.
//!
//! Run with: `cargo bench -p stevedore-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use serde_json::json;
use std::hint::black_box;
use stevedore_core::{
    BuiltinTemplates, ComponentDescriptor, ComponentKind, DefaultsTable, GrantedFeatures,
    Pipeline, PipelineOptions, Registry, Template,
};

/// Create a registry of N gateways, each depending on the previous one.
fn create_chain(size: usize) -> Registry {
    let mut registry = Registry::new();
    for i in 0..size {
        let mut descriptor = ComponentDescriptor::new(format!("gw-{i}"), ComponentKind::Gateway);
        if i > 0 {
            descriptor = descriptor.depends_on(format!("gw-{}", i - 1));
        }
        registry.register(descriptor).expect("register");
    }
    registry
}

fn granted() -> GrantedFeatures {
    "monitoring,console,gateway,registry".parse().expect("parse")
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_template_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("template_parse");

    for kind in ComponentKind::ALL {
        let source = BuiltinTemplates::for_kind(kind);
        group.bench_with_input(BenchmarkId::from_parameter(kind), source, |b, source| {
            b.iter(|| black_box(Template::parse(source)));
        });
    }

    group.finish();
}

fn bench_range_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("range_render");
    let template = Template::parse("{{ range .Routes }}- path: {{ . }}\n{{ end }}").expect("parse");

    for size in [10, 100, 1000].iter() {
        let routes: Vec<String> = (0..*size).map(|i| format!("/r{i}")).collect();
        let data = json!({ "Routes": routes });

        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| black_box(template.render(data)));
        });
    }

    group.finish();
}

fn bench_pipeline_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_run");

    for size in [10, 50, 200].iter() {
        let registry = create_chain(*size);
        let parallel = Pipeline::new(DefaultsTable::default(), granted());
        let sequential = parallel.clone().with_options(PipelineOptions {
            skip_disabled: true,
            parallel: false,
        });

        group.bench_with_input(BenchmarkId::new("parallel", size), &registry, |b, registry| {
            b.iter(|| {
                let mut registry = registry.clone();
                black_box(parallel.run(&mut registry, &BuiltinTemplates))
            });
        });

        group.bench_with_input(BenchmarkId::new("sequential", size), &registry, |b, registry| {
            b.iter(|| {
                let mut registry = registry.clone();
                black_box(sequential.run(&mut registry, &BuiltinTemplates))
            });
        });
    }

    group.finish();
}

fn bench_dependency_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("dependency_order");

    for size in [10, 100, 250].iter() {
        let registry = create_chain(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &registry, |b, registry| {
            b.iter(|| black_box(registry.dependency_order()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_template_parse,
    bench_range_render,
    bench_pipeline_run,
    bench_dependency_order
);
criterion_main!(benches);
