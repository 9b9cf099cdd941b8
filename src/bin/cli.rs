//! dbwire CLI Client
//!
//! Command-line interface for poking at the engine through the pooled client.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};
use dbwire::config::{ENV_HOST, ENV_POOL_SIZE, ENV_PORT, ENV_RECONNECT_DELAY, ENV_REQUEST_TIMEOUT};
use dbwire::{Action, ClientConfig, Command, EngineClient, WireError};
use parking_lot::Mutex;
use serde_json::json;
use tracing_subscriber::{fmt, EnvFilter};

/// dbwire CLI
#[derive(Parser, Debug)]
#[command(name = "dbwire-cli")]
#[command(about = "CLI for the storage engine client")]
#[command(version)]
struct Args {
    /// Engine host
    #[arg(long, env = ENV_HOST, default_value = "127.0.0.1")]
    host: String,

    /// Engine port
    #[arg(short, long, env = ENV_PORT, default_value_t = 9000)]
    port: u16,

    /// Pooled connections
    #[arg(long, env = ENV_POOL_SIZE, default_value_t = 4)]
    pool_size: usize,

    /// Per-request deadline in milliseconds
    #[arg(long, env = ENV_REQUEST_TIMEOUT, default_value_t = 5000)]
    timeout_ms: u64,

    /// Delay before a spent pooled socket is re-dialed, in milliseconds
    #[arg(long, env = ENV_RECONNECT_DELAY, default_value_t = 100)]
    reconnect_delay_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ping the engine
    Ping,

    /// Send a raw JSON command and print the normalized reply
    Send {
        /// Command as JSON, e.g. '{"action":"listDatabases","userId":"u1"}'
        json: String,
    },

    /// Load test: generated inserts sent as `bulk` batches
    Bulk {
        /// Total inserts to generate
        #[arg(long, default_value = "500")]
        total: usize,

        /// Concurrent workers
        #[arg(long, default_value = "20")]
        concurrency: usize,

        /// Inserts per bulk batch
        #[arg(long, default_value = "25")]
        batch_size: usize,
    },

    /// Insert a few vectors and run a similarity query
    VectorDemo,
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,dbwire=info"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> dbwire::Result<()> {
    let config = ClientConfig::builder()
        .host(args.host)
        .port(args.port)
        .pool_size(args.pool_size)
        .request_timeout_ms(args.timeout_ms)
        .reconnect_delay_ms(args.reconnect_delay_ms)
        .build();

    let client = Arc::new(EngineClient::new(config)?);

    match args.command {
        Commands::Ping => {
            let reply = client.send_with_timeout(&Command::ping()).await?;
            println!("ping response: {}", reply.into_value());
        }
        Commands::Send { json } => {
            let command: Command = serde_json::from_str(&json)
                .map_err(|e| WireError::Serialization(format!("invalid command: {}", e)))?;
            let reply = client.send_with_timeout(&command).await?;
            println!("{}", pretty(&reply.into_value()));
        }
        Commands::Bulk {
            total,
            concurrency,
            batch_size,
        } => bulk_load(client, total, concurrency, batch_size).await,
        Commands::VectorDemo => vector_demo(&client).await?,
    }

    Ok(())
}

// =============================================================================
// Bulk load
// =============================================================================

fn make_insert(run_id: u128, i: usize) -> Command {
    Command::new(Action::Insert)
        .user("loadtest")
        .database("load-db")
        .collection("user-db")
        .data(json!({
            "id": format!("{}_{}", run_id, i),
            "name": format!("BulkUser_{}", i),
            "email": format!("bulk{}@example.com", i),
        }))
}

async fn bulk_load(client: Arc<EngineClient>, total: usize, concurrency: usize, batch_size: usize) {
    let run_id = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();

    let ops: Vec<Command> = (0..total).map(|i| make_insert(run_id, i)).collect();
    let batches: VecDeque<Vec<Command>> = ops
        .chunks(batch_size.max(1))
        .map(<[Command]>::to_vec)
        .collect();
    let workers = concurrency.max(1).min(batches.len().max(1));
    let queue = Arc::new(Mutex::new(batches));

    let start = Instant::now();
    let mut handles = Vec::with_capacity(workers);
    for worker in 0..workers {
        let client = Arc::clone(&client);
        let queue = Arc::clone(&queue);
        handles.push(tokio::spawn(async move {
            let (mut sent, mut errors) = (0usize, 0usize);
            loop {
                let next = queue.lock().pop_front();
                let Some(batch) = next else {
                    break;
                };
                let size = batch.len();
                match client.send_with_timeout(&Command::bulk(batch)).await {
                    Ok(_) => sent += size,
                    Err(e) => {
                        errors += size;
                        tracing::warn!(worker, "bulk send error: {}", e);
                    }
                }
            }
            (sent, errors)
        }));
    }

    let (mut sent, mut errors) = (0usize, 0usize);
    for handle in handles {
        match handle.await {
            Ok((s, e)) => {
                sent += s;
                errors += e;
            }
            Err(e) => tracing::error!("bulk worker aborted: {}", e),
        }
    }

    let elapsed = start.elapsed();
    let ops_per_sec = sent as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
    println!(
        "Done. total={} sent={} errors={} time={}ms ops/s={:.2}",
        total,
        sent,
        errors,
        elapsed.as_millis(),
        ops_per_sec
    );
}

// =============================================================================
// Vector demo
// =============================================================================

async fn vector_demo(client: &EngineClient) -> dbwire::Result<()> {
    let scope = |action| {
        Command::new(action)
            .user("vector-user")
            .database("vecdb")
            .collection("media")
    };

    let vectors = [
        json!({"id": "img1", "modality": "image", "vector": [0.1, 0.2, 0.3, 0.4], "metadata": {"label": "cat"}}),
        json!({"id": "img2", "modality": "image", "vector": [0.11, 0.19, 0.31, 0.39], "metadata": {"label": "cat"}}),
        json!({"id": "img3", "modality": "image", "vector": [0.9, 0.8, 0.7, 0.6], "metadata": {"label": "dog"}}),
        json!({"id": "aud1", "modality": "audio", "vector": [0.05, 0.06, 0.07, 0.08], "metadata": {"label": "speech"}}),
    ];

    for vector in vectors {
        let id = vector["id"].clone();
        let reply = client
            .send_with_timeout(&scope(Action::InsertVector).data(vector))
            .await?;
        println!("insertVector {} {}", id, reply.into_value());
    }

    let query = scope(Action::QueryVector)
        .field("modality", json!("image"))
        .field("vector", json!([0.1, 0.2, 0.3, 0.4]))
        .field("k", json!(3))
        .field("metric", json!("cosine"));
    let reply = client.send_with_timeout(&query).await?;
    println!("query results {}", pretty(&reply.into_value()));
    Ok(())
}

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
