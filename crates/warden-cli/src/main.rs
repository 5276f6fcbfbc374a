//! Warden operator CLI.
//!
//! Runs the authorization kernel against JSON documents on disk, so
//! operators can check what the PII scanner sees and dry-run a decision
//! before wiring the kernel into a service.
//!
//! # Quick Start
//!
//! ```bash
//! # What PII does this payload carry?
//! warden scan ./payload.json
//!
//! # Mask it for a log line
//! warden protect ./payload.json --level mask
//!
//! # Would this context be allowed to read this record?
//! warden check-read --context ./ctx.json --record ./record.json --resource employeeProfile
//! ```
//!
//! Exit codes: `0` success, `1` input or configuration error, `2` usage error, `3` access denied.

mod commands;
mod style;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use warden::{ProtectionLevel, ResourceType};

/// Warden - fail-closed multi-tenant authorization and data-governance kernel.
#[derive(Parser)]
#[command(name = "warden")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Directory holding warden.toml and warden.local.toml.
    #[arg(long, global = true, default_value = ".")]
    project: PathBuf,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect PII in a JSON document (plain text is scanned as one string).
    Scan {
        /// Path to the document.
        file: PathBuf,
    },

    /// Write a protected copy of a document to stdout.
    Protect {
        /// Path to the document.
        file: PathBuf,

        /// Protection level (mask, encrypt, tokenize).
        #[arg(short, long, default_value = "mask")]
        level: ProtectionLevel,

        /// Print the full protection result instead of the protected data.
        #[arg(long)]
        report: bool,
    },

    /// Dry-run the tenant guard for a read.
    CheckRead {
        /// Authorization context (JSON).
        #[arg(long)]
        context: PathBuf,

        /// Resource record governance metadata (JSON).
        #[arg(long)]
        record: PathBuf,

        /// Resource type token, e.g. employeeProfile.
        #[arg(long)]
        resource: ResourceType,
    },

    /// Dry-run the full authorization pipeline for a request.
    Authorize {
        /// Authorization context (JSON).
        #[arg(long)]
        context: PathBuf,

        /// Authorization request (JSON).
        #[arg(long)]
        request: PathBuf,

        /// Rule policy (JSON). Defaults to the HR baseline policy.
        #[arg(long)]
        policy: Option<PathBuf>,
    },

    /// Configuration commands.
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration with keys redacted.
    Show,

    /// Load and validate every configuration layer.
    Validate,
}

fn main() -> ExitCode {
    // Logs go to stderr so stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    style::set_no_color(cli.no_color || std::env::var_os("NO_COLOR").is_some());

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            style::print_error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let project = cli.project;
    match cli.command {
        Commands::Scan { file } => commands::scan::run(&project, &file),
        Commands::Protect {
            file,
            level,
            report,
        } => commands::protect::run(&project, &file, level, report),
        Commands::CheckRead {
            context,
            record,
            resource,
        } => commands::check::read(&project, &context, &record, resource),
        Commands::Authorize {
            context,
            request,
            policy,
        } => commands::check::authorize(&project, &context, &request, policy.as_deref()),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => commands::config::show(&project),
            ConfigCommands::Validate => commands::config::validate(&project),
        },
    }
}
