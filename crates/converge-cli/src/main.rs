//! ECS Converge CLI
//!
//! The `converge` command works offline on container-definition documents
//! and resource identifiers.
//!
//! ## Commands
//!
//! - `normalize`: print the canonical form of a document
//! - `equivalent`: compare two documents, exit 1 when they differ
//! - `validate`: check that a document decodes
//! - `parse-id`: split a composite resource id into its parts
//! - `config`: print the effective settings after `CONVERGE_*` overrides

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use converge_core::{
    canonicalize, equivalent, ContainerSpec, ConvergeConfig, NetworkMode, ServiceHandle,
    TaskSetHandle,
};
use tracing::{debug, info, Level};

#[derive(Parser)]
#[command(name = "converge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Client-side reconciliation helpers for ECS resources", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the canonical form of a container-definitions document
    Normalize {
        /// Path to the document (JSON array of container definitions)
        file: PathBuf,

        /// Task network mode; `awsvpc` infers host ports
        #[arg(short, long, default_value = "bridge")]
        network_mode: String,
    },

    /// Compare two container-definitions documents
    Equivalent {
        a: PathBuf,
        b: PathBuf,

        /// Task network mode; `awsvpc` infers host ports
        #[arg(short, long, default_value = "bridge")]
        network_mode: String,
    },

    /// Check that a container-definitions document decodes
    Validate { file: PathBuf },

    /// Parse a composite resource id
    ParseId {
        #[arg(value_enum)]
        kind: IdKind,

        /// The id, e.g. `ecs-svc/123,web,prod` or `prod/web`
        id: String,
    },

    /// Print the effective configuration as JSON
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum IdKind {
    /// TASK_SET_ID,SERVICE,CLUSTER
    TaskSet,
    /// CLUSTER/SERVICE
    ServiceImport,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    converge_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Normalize { file, network_mode } => {
            println!("{}", cmd_normalize(&file, &network_mode)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Equivalent {
            a,
            b,
            network_mode,
        } => {
            if cmd_equivalent(&a, &b, &network_mode)? {
                println!("equivalent");
                Ok(ExitCode::SUCCESS)
            } else {
                println!("different");
                Ok(ExitCode::FAILURE)
            }
        }
        Commands::Validate { file } => {
            let count = cmd_validate(&file)?;
            println!("ok: {} container definition(s)", count);
            Ok(ExitCode::SUCCESS)
        }
        Commands::ParseId { kind, id } => {
            println!("{}", cmd_parse_id(kind, &id)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config => {
            let config = ConvergeConfig::from_env().context("Invalid CONVERGE_* settings")?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn read_document(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read container definitions: {:?}", path))
}

fn parse_network_mode(raw: &str) -> Result<NetworkMode> {
    raw.parse::<NetworkMode>()
        .with_context(|| format!("Invalid --network-mode {:?}", raw))
}

fn cmd_normalize(file: &Path, network_mode: &str) -> Result<String> {
    let mode = parse_network_mode(network_mode)?;
    let doc = read_document(file)?;
    let canonical = canonicalize(&doc, mode.is_awsvpc())
        .with_context(|| format!("Failed to normalize {:?}", file))?;
    debug!(file = ?file, network_mode = mode.as_str(), "normalized");
    Ok(canonical)
}

fn cmd_equivalent(a: &Path, b: &Path, network_mode: &str) -> Result<bool> {
    let mode = parse_network_mode(network_mode)?;
    let left = read_document(a)?;
    let right = read_document(b)?;
    let same = equivalent(&left, &right, mode.is_awsvpc())
        .with_context(|| format!("Failed to compare {:?} and {:?}", a, b))?;
    info!(a = ?a, b = ?b, equivalent = same, "compared container definitions");
    Ok(same)
}

fn cmd_validate(file: &Path) -> Result<usize> {
    let doc = read_document(file)?;
    let spec = ContainerSpec::from_json(&doc).with_context(|| format!("Invalid {:?}", file))?;
    Ok(spec.len())
}

fn cmd_parse_id(kind: IdKind, id: &str) -> Result<String> {
    let rendered = match kind {
        IdKind::TaskSet => {
            let handle: TaskSetHandle = id.parse()?;
            serde_json::to_string_pretty(&handle)?
        }
        IdKind::ServiceImport => {
            let handle = ServiceHandle::from_import_id(id)?;
            serde_json::to_string_pretty(&handle)?
        }
    };
    Ok(rendered)
}
