//! dbwire WAL Replay
//!
//! Replays every `.wal` file under a directory into the engine.

use std::path::PathBuf;

use clap::Parser;
use dbwire::replay::{ENV_CONCURRENCY, ReplayOptions, ReplayOutcome, Replayer};
use dbwire::wal::WAL_SUFFIX;
use dbwire::{ClientConfig, EngineClient};
use tracing_subscriber::{fmt, EnvFilter};

/// dbwire WAL replay
#[derive(Parser, Debug)]
#[command(name = "dbwire-replay")]
#[command(about = "Replay engine write-ahead logs through the pooled client")]
#[command(version)]
struct Args {
    /// Number of concurrent workers
    #[arg(env = ENV_CONCURRENCY, default_value = "8")]
    concurrency: usize,

    /// Only report file and entry counts; send nothing
    #[arg(long)]
    dry: bool,

    /// Directory searched recursively for log files
    #[arg(short, long, default_value = "data")]
    root: PathBuf,

    /// Log file name suffix
    #[arg(long, default_value = WAL_SUFFIX)]
    suffix: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,dbwire=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        tracing::error!("Replay failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> dbwire::Result<()> {
    tracing::info!("dbwire replay v{}", dbwire::VERSION);

    let replayer = Replayer::new(ReplayOptions {
        root: args.root,
        suffix: args.suffix,
        concurrency: args.concurrency,
        dry: args.dry,
    });

    let outcome = replayer
        .execute(|| {
            let config = ClientConfig::from_env()?;
            tracing::info!("Engine address: {}", config.engine_addr());
            EngineClient::new(config)
        })
        .await?;

    if let ReplayOutcome::Replayed(summary) = outcome {
        tracing::info!(
            "Done. sent={} skipped={} errors={} time={}ms",
            summary.sent,
            summary.skipped,
            summary.errors,
            summary.elapsed.as_millis()
        );
    }
    Ok(())
}
