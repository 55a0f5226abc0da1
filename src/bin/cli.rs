//! kvbridge CLI
//!
//! Selects an API version, starts the network and opens a database.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use kvbridge::{NetworkOption, RuntimeConfig, SimEngine};
use tracing_subscriber::{fmt, EnvFilter};

/// kvbridge CLI
#[derive(Parser, Debug)]
#[command(name = "kvbridge-cli")]
#[command(about = "Client runtime for the key-value engine")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the supported API version range
    Versions,

    /// Open the database and report the connection state
    Open {
        /// API version to select (default: newest supported)
        #[arg(short, long)]
        api_version: Option<i32>,

        /// Cluster file path
        #[arg(short, long)]
        cluster_file: Option<PathBuf>,

        /// Network option, `name` or `name=value` (repeatable)
        #[arg(short, long = "option", value_name = "NAME[=VALUE]")]
        options: Vec<NetworkOption>,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kvbridge=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    match args.command {
        Commands::Versions => {
            println!(
                "kvbridge v{}: API versions {}..={} (header {})",
                kvbridge::VERSION,
                kvbridge::MIN_API_VERSION,
                kvbridge::MAX_API_VERSION,
                kvbridge::HEADER_API_VERSION
            );
        }
        Commands::Open {
            api_version,
            cluster_file,
            options,
        } => {
            if let Err(e) = open(api_version, cluster_file, options) {
                tracing::error!("{}", e);
                process::exit(1);
            }
        }
    }
}

fn open(
    api_version: Option<i32>,
    cluster_file: Option<PathBuf>,
    options: Vec<NetworkOption>,
) -> kvbridge::Result<()> {
    let version = api_version.unwrap_or(kvbridge::MAX_API_VERSION);

    let mut builder = RuntimeConfig::builder().network_options(options);
    if let Some(path) = cluster_file {
        builder = builder.cluster_file(path);
    }

    let runtime =
        kvbridge::select_api_version_with(version, builder.build(), Arc::new(SimEngine::new()))?;
    tracing::info!("API version {} selected", runtime.api_version());

    let database = runtime.open(None)?;
    println!(
        "Opened {:?} (connected: {})",
        database,
        runtime.is_connected()
    );

    drop(database);
    runtime.stop_network()?;

    if let Some(code) = runtime.last_network_error() {
        tracing::warn!("Network thread reported error {}", code);
    }
    println!("Network stopped (connected: {})", runtime.is_connected());

    Ok(())
}
