//! # Stevedore - Component Installer
//!
//! The installer binary around the deterministic `stevedore-core` pipeline.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 apps/stevedore (THE BINARY)              │
//! │                                                          │
//! │  ┌──────────────┐   ┌─────────────┐   ┌──────────────┐   │
//! │  │  TOML config │   │    CLI      │   │  Render API  │   │
//! │  │   (toml)     │   │   (clap)    │   │   (axum)     │   │
//! │  └──────┬───────┘   └──────┬──────┘   └──────┬───────┘   │
//! │         └──────────────────┼─────────────────┘           │
//! │                            ▼                             │
//! │                   ┌────────────────┐                     │
//! │                   │ stevedore-core │                     │
//! │                   │ (THE PIPELINE) │                     │
//! │                   └────────────────┘                     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! stevedore init
//! stevedore check
//! stevedore render --out-dir manifests --auto-enable
//! stevedore serve --host 0.0.0.0 --port 8080
//! ```

use clap::Parser;
use std::process::ExitCode;
use stevedore::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    // STEVEDORE_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("STEVEDORE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "stevedore=info,stevedore_core=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    match cli::execute(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  ┌─┐┌┬┐┌─┐┬  ┬┌─┐┌┬┐┌─┐┬─┐┌─┐
  └─┐ │ ├┤ └┐┌┘├┤  │││ │├┬┘├┤
  └─┘ ┴ └─┘ └┘ └─┘─┴┘└─┘┴└─└─┘

  Component Installer v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
