//! # CLI Command Implementations

use crate::api::{self, ComponentsResponse, OrderResponse, OutcomeJson, RenderResponse};
use crate::config::{Installation, SAMPLE_CONFIG};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use stevedore_core::{Manifest, PipelineOptions, RunReport, StevedoreError};

fn print_json<T: serde::Serialize>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn exit_code(ok: bool) -> ExitCode {
    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Write the sample configuration.
pub fn cmd_init(config: &Path, force: bool) -> Result<(), StevedoreError> {
    if config.exists() && !force {
        return Err(StevedoreError::Config(format!(
            "'{}' already exists. Use --force to overwrite.",
            config.display()
        )));
    }

    std::fs::write(config, SAMPLE_CONFIG)
        .map_err(|e| StevedoreError::Io(format!("Cannot write '{}': {}", config.display(), e)))?;

    println!("Wrote sample configuration to {}", config.display());
    Ok(())
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

/// Validate dependencies and license grants without rendering.
pub fn cmd_check(
    config: &Path,
    features: Option<&str>,
    json_mode: bool,
) -> Result<ExitCode, StevedoreError> {
    let installation = Installation::load(config, features)?;
    let (registry, _) = installation.prepared_registry(false)?;
    let response = ComponentsResponse::from_registry(&registry, &installation.granted);
    let ready = response.components.iter().all(|c| c.is_ready());

    if json_mode {
        print_json(&response);
        return Ok(exit_code(ready));
    }

    println!("Stevedore Check");
    println!("===============");
    println!("Config: {}", config.display());
    println!();
    for component in &response.components {
        let verdict = if !component.enabled {
            "disabled".to_string()
        } else if !component.unmet.is_empty() {
            format!("unmet: {}", component.unmet.join(", "))
        } else if !component.authorized {
            format!("license '{}' not granted", component.license_tag)
        } else {
            "ok".to_string()
        };
        println!("  {:<20} {:<12} {}", component.name, component.kind, verdict);
    }

    Ok(exit_code(ready))
}

// =============================================================================
// DEFAULTS COMMAND
// =============================================================================

/// Show every component after completion.
pub fn cmd_defaults(
    config: &Path,
    features: Option<&str>,
    json_mode: bool,
) -> Result<(), StevedoreError> {
    let installation = Installation::load(config, features)?;
    let (registry, _) = installation.prepared_registry(false)?;

    if json_mode {
        let descriptors: Vec<_> = registry.iter().map(|(_, d)| d).collect();
        print_json(&descriptors);
        return Ok(());
    }

    for (_, descriptor) in registry.iter() {
        println!("{} ({})", descriptor.name, descriptor.kind());
        println!("  namespace:   {}", descriptor.namespace);
        println!("  enabled:     {}", descriptor.enabled);
        println!("  license tag: {}", descriptor.license_tag);
        if !descriptor.dependencies.is_empty() {
            println!("  depends on:  {}", descriptor.dependencies.join(", "));
        }
        let settings = serde_json::to_value(&descriptor.settings).unwrap_or_default();
        if let Some(fields) = settings.as_object() {
            for (key, value) in fields.iter().filter(|(key, _)| key.as_str() != "kind") {
                println!("  {:<12} {}", format!("{}:", key), value);
            }
        }
    }
    Ok(())
}

// =============================================================================
// ORDER COMMAND
// =============================================================================

/// Show components in dependency order.
pub fn cmd_order(config: &Path, features: Option<&str>, json_mode: bool) -> Result<(), StevedoreError> {
    let installation = Installation::load(config, features)?;
    let response = OrderResponse::from_registry(&installation.registry);

    if json_mode {
        print_json(&response);
        return Ok(());
    }

    for (position, name) in response.order.iter().enumerate() {
        println!("{:>3}. {}", position.saturating_add(1), name);
    }
    Ok(())
}

// =============================================================================
// RENDER COMMAND
// =============================================================================

/// Options of `stevedore render`.
#[derive(Debug, Clone)]
pub struct RenderArgs {
    pub out_dir: PathBuf,
    pub auto_enable: bool,
    pub dry_run: bool,
    pub verbose: bool,
}

/// Render every component and write the manifests of the rendered ones.
///
/// Components in any other state never produce a file, and a file left in
/// `out_dir` by an earlier run for such a component is removed.
pub fn cmd_render(
    config: &Path,
    features: Option<&str>,
    json_mode: bool,
    args: &RenderArgs,
) -> Result<ExitCode, StevedoreError> {
    let installation = Installation::load(config, features)?;
    let (registry, auto_enabled) = installation.prepared_registry(args.auto_enable)?;

    let options = PipelineOptions {
        skip_disabled: true,
        parallel: true,
    };
    let report = installation
        .pipeline(installation.granted.clone(), options)
        .evaluate(&registry, &installation.templates);

    if !args.dry_run {
        write_manifests(&args.out_dir, report.manifests())?;
        remove_stale_manifests(&args.out_dir, &report)?;
    }

    if json_mode {
        print_json(&RenderResponse::new(&report, auto_enabled));
        return Ok(exit_code(report.is_clean()));
    }

    for name in &auto_enabled {
        println!("auto-enabled {}", name);
    }
    for outcome in report.outcomes().iter().map(OutcomeJson::from) {
        match (&outcome.manifest, &outcome.reason) {
            (Some(manifest), _) => {
                let target = if args.dry_run {
                    "(dry run)".to_string()
                } else {
                    args.out_dir.join(&manifest.file_name).display().to_string()
                };
                println!("  {:<20} {:<14} {}", outcome.component, outcome.state, target);
                if args.verbose {
                    println!("    digest: {}", manifest.digest);
                }
            }
            (None, reason) => println!(
                "  {:<20} {:<14} {}",
                outcome.component,
                outcome.state,
                reason.as_deref().unwrap_or_default()
            ),
        }
    }

    let summary = report.summary();
    println!();
    println!(
        "rendered {}, disabled {}, unmet {}, rejected {}, failed {}",
        summary.rendered, summary.disabled, summary.unmet, summary.rejected, summary.failed
    );
    Ok(exit_code(report.is_clean()))
}

fn write_manifests<'a>(
    out_dir: &Path,
    manifests: impl Iterator<Item = &'a Manifest>,
) -> Result<(), StevedoreError> {
    std::fs::create_dir_all(out_dir).map_err(|e| {
        StevedoreError::Io(format!("Cannot create '{}': {}", out_dir.display(), e))
    })?;

    for manifest in manifests {
        let path = out_dir.join(manifest.file_name());
        std::fs::write(&path, &manifest.text)
            .map_err(|e| StevedoreError::Io(format!("Cannot write '{}': {}", path.display(), e)))?;
        tracing::debug!(component = %manifest.component, path = %path.display(), "wrote manifest");
    }
    Ok(())
}

/// Remove the files of components that did not reach `Rendered` this run.
fn remove_stale_manifests(out_dir: &Path, report: &RunReport) -> Result<(), StevedoreError> {
    for outcome in report.outcomes().iter().filter(|r| r.outcome.manifest().is_none()) {
        let path = out_dir.join(Manifest::file_name_for(&outcome.component));
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(
                    component = %outcome.component,
                    state = %outcome.outcome.state(),
                    path = %path.display(),
                    "removed stale manifest"
                );
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(StevedoreError::Io(format!(
                    "Cannot remove '{}': {}",
                    path.display(),
                    e
                )));
            }
        }
    }
    Ok(())
}

// =============================================================================
// SERVE COMMAND
// =============================================================================

/// Start the HTTP render API.
pub async fn cmd_serve(
    config: &Path,
    features: Option<&str>,
    host: &str,
    port: u16,
) -> Result<(), StevedoreError> {
    let installation = Installation::load(config, features)?;

    println!("Stevedore Render API Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:       {}", host);
    println!("  Port:       {}", port);
    println!("  Config:     {}", config.display());
    println!("  Components: {}", installation.registry.len());
    println!();
    println!("Endpoints:");
    println!("  GET  /health                     - Health check");
    println!("  GET  /components                 - Components and verdicts");
    println!("  GET  /order                      - Dependency order");
    println!("  POST /render                     - Render every component");
    println!("  GET  /components/{{name}}/manifest - Render one component");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, installation).await
}
