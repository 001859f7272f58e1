//! # Stevedore CLI Module
//!
//! ## Available Commands
//!
//! - `init` - Write a sample configuration
//! - `check` - Validate dependencies and license grants
//! - `defaults` - Show completed components
//! - `order` - Show the dependency order
//! - `render` - Render manifests into a directory
//! - `serve` - Start the HTTP render API

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use stevedore_core::StevedoreError;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Stevedore - component installer
///
/// Completes, validates and license-checks declaratively configured
/// components, then renders their Kubernetes manifests.
#[derive(Parser, Debug)]
#[command(name = "stevedore")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the installer configuration
    #[arg(short, long, global = true, default_value = "stevedore.toml")]
    pub config: PathBuf,

    /// Granted license features, comma-separated (overrides STEVEDORE_FEATURES and the file)
    #[arg(long, global = true)]
    pub features: Option<String>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a sample configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Check dependencies and license grants of every component
    Check,

    /// Show every component after default completion
    Defaults,

    /// Show components in dependency order
    Order,

    /// Render manifests of every renderable component
    Render {
        /// Directory receiving one <component>.yaml per rendered component
        #[arg(short, long, default_value = "manifests")]
        out_dir: PathBuf,

        /// Enable the dependencies of enabled components
        #[arg(long)]
        auto_enable: bool,

        /// Render and report without writing files
        #[arg(long)]
        dry_run: bool,
    },

    /// Start the HTTP render API
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
///
/// `check` and `render` report failure through the exit code when any
/// enabled component cannot be rendered.
pub async fn execute(cli: Cli) -> Result<ExitCode, StevedoreError> {
    let config = cli.config.as_path();
    let features = cli.features.as_deref();
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Init { force }) => cmd_init(config, force).map(|()| ExitCode::SUCCESS),
        Some(Commands::Check) | None => cmd_check(config, features, json_mode),
        Some(Commands::Defaults) => {
            cmd_defaults(config, features, json_mode).map(|()| ExitCode::SUCCESS)
        }
        Some(Commands::Order) => cmd_order(config, features, json_mode).map(|()| ExitCode::SUCCESS),
        Some(Commands::Render {
            out_dir,
            auto_enable,
            dry_run,
        }) => cmd_render(
            config,
            features,
            json_mode,
            &RenderArgs {
                out_dir,
                auto_enable,
                dry_run,
                verbose: cli.verbose,
            },
        ),
        Some(Commands::Serve { host, port }) => cmd_serve(config, features, &host, port)
            .await
            .map(|()| ExitCode::SUCCESS),
    }
}
