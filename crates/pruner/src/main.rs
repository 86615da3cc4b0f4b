// pruner/src/main.rs

use clap::{Parser, Subcommand};
use pruner::{run, PruneConfig, PruneOptions, StatusCommandProbe};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ledger-prune")]
#[command(about = "Prunes and compacts a stopped ledger node's stores", version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Node data directory holding blockstore.db and state.db
    #[arg(short, long, global = true)]
    data_dir: Option<String>,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Prune and compact blockstore.db and state.db
    Prune {
        #[command(subcommand)]
        command: PruneCommands,
    },
}

#[derive(Subcommand)]
enum PruneCommands {
    /// Start pruning (make sure your node is down!)
    ///
    /// Everything below the retention heights is deleted from
    /// blockstore.db and state.db, then both stores are compacted. ABCI
    /// responses are the highest-volume records and are pruned far more
    /// aggressively by default; override with -m.
    Start {
        /// Number of most-recent blocks to keep
        #[arg(short = 'f', long, default_value = "188000")]
        full_height: String,

        /// Number of most-recent ABCI responses to keep
        #[arg(short = 'm', long, default_value = "1000")]
        min_height: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "{}={},storage={}",
                    env!("CARGO_PKG_NAME"),
                    log_level,
                    log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = match &cli.config {
        Some(path) => PruneConfig::from_file(path)?,
        None => PruneConfig::default(),
    };
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir.into();
    }

    match cli.command {
        Commands::Prune { command } => match command {
            PruneCommands::Start {
                full_height,
                min_height,
            } => {
                let opts = PruneOptions::parse(&full_height, &min_height)?;
                let probe = StatusCommandProbe::new(&config.status_command);
                run(&config, &opts, &probe)?;
                tracing::info!("pruning run complete");
            }
        },
    }

    Ok(())
}
