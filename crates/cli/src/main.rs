//! Support bundle triage CLI
//!
//! Imports an extracted RKE2 support bundle and prints what needs
//! attention, the parsed inventory and host logs.

mod commands;
mod config;
mod output;

use anyhow::Result;
use bundle_lib::{import_bundle, ImportOptions, StructuredLogger};
use clap::{Parser, Subcommand};
use commands::{inventory, logs, triage};
use output::{print_error, OutputFormat};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Offline triage for RKE2 support bundles
#[derive(Parser)]
#[command(name = "bundle-triage")]
#[command(author, version, about = "Offline triage for RKE2 support bundles", long_about = None)]
pub struct Cli {
    /// Extracted bundle directory (or a directory holding exactly one)
    #[arg(env = "BUNDLE_TRIAGE_PATH")]
    pub path: String,

    /// Output format (defaults to the configured format, then table)
    #[arg(long, short, global = true)]
    pub format: Option<OutputFormat>,

    /// Filter by namespace (`all` shows every namespace)
    #[arg(long, short, global = true)]
    pub namespace: Option<String>,

    /// Explain import errors and print import warnings
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Largest accepted bundle in MiB
    #[arg(long, global = true)]
    pub max_size_mib: Option<u64>,

    /// Emit logs as JSON on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Bundle metadata, inventory counts and import status
    Summary,

    /// Severity-ranked list of problems
    Attention {
        /// Show every item instead of the first N
        #[arg(long, short)]
        expanded: bool,

        /// Number of items shown when not expanded
        #[arg(long)]
        cap: Option<usize>,
    },

    /// List pods
    Pods,

    /// List deployments
    Deployments,

    /// List services
    Services,

    /// List namespaces
    Namespaces,

    /// List custom resource definitions
    Crds,

    /// List nodes
    Nodes,

    /// List daemonsets
    Daemonsets,

    /// List events
    Events {
        /// Only show Warning events
        #[arg(long)]
        warnings_only: bool,
    },

    /// Node, etcd and host health
    Health,

    /// Per-artifact import status
    Report,

    /// List pod and host log files
    Logs {
        /// Only logs of this pod
        #[arg(long, short)]
        pod: Option<String>,
    },

    /// Print one log file
    Log {
        /// Log path, absolute or relative to the bundle root
        path: String,

        /// Only print the last N lines
        #[arg(long)]
        tail: Option<usize>,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let settings = config::Settings::load()?;
    let format = cli
        .format
        .unwrap_or_else(|| OutputFormat::from_setting(settings.format.as_deref()));
    let max_bytes = cli
        .max_size_mib
        .map(|mib| mib.saturating_mul(1024 * 1024))
        .unwrap_or_else(|| settings.max_uncompressed_bytes());

    let options = ImportOptions::default()
        .with_max_uncompressed_bytes(max_bytes)
        .with_verbose(cli.verbose);

    let bundle = match import_bundle(&cli.path, &options).await {
        Ok(bundle) => bundle,
        Err(err) => {
            if let Some(elaboration) = &err.elaboration {
                print_error(elaboration);
            }
            let context = format!("Failed to import bundle [{}]", err.code());
            return Err(anyhow::Error::new(err).context(context));
        }
    };

    if cli.verbose && format == OutputFormat::Table {
        triage::show_warnings(&bundle);
    }

    let logger = StructuredLogger::new(&cli.path);
    let namespace = cli.namespace.as_deref();

    match cli.command {
        Commands::Summary => triage::show_summary(&bundle, &logger, format)?,
        Commands::Attention { expanded, cap } => {
            let cap = cap.unwrap_or(settings.display_cap);
            triage::show_attention(&bundle, &logger, cap, expanded, format)?;
        }
        Commands::Pods => inventory::list_pods(&bundle, namespace, format)?,
        Commands::Deployments => inventory::list_deployments(&bundle, namespace, format)?,
        Commands::Services => inventory::list_services(&bundle, namespace, format)?,
        Commands::Namespaces => inventory::list_namespaces(&bundle, format)?,
        Commands::Crds => inventory::list_crds(&bundle, format)?,
        Commands::Nodes => inventory::list_nodes(&bundle, format)?,
        Commands::Daemonsets => inventory::list_daemonsets(&bundle, namespace, format)?,
        Commands::Events { warnings_only } => {
            inventory::list_events(&bundle, namespace, warnings_only, format)?;
        }
        Commands::Health => triage::show_health(&bundle, format)?,
        Commands::Report => triage::list_artifacts(&bundle, format)?,
        Commands::Logs { pod } => logs::list_logs(&bundle, namespace, pod.as_deref(), format)?,
        Commands::Log { path, tail } => logs::read_log(&bundle, &path, tail).await?,
    }

    Ok(())
}
