//! Replay Module
//!
//! Drives the contents of a WAL directory through the engine client.
//!
//! ## Responsibilities
//! - Discover log files and decode them into one ordered worklist
//! - Map records to commands, skipping the ones with no mapping
//! - Dispatch with a fixed number of workers sharing the worklist
//! - Count failures and keep going (best effort)
//!
//! Workers pull from the same cursor, so there is no global ordering across
//! workers. Replay is only safe for operation sets that tolerate reordering
//! (inserts carrying their own id, last-write-wins updates and deletes).

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinSet;

use crate::error::{Result, WireError};
use crate::network::EngineClient;
use crate::wal::{discover_wal_files, WalReader, WalRecord, WAL_SUFFIX};

/// Only this many dispatch failures are logged individually
const MAX_LOGGED_ERRORS: usize = 10;

/// Environment variable consulted for the default worker count
pub const ENV_CONCURRENCY: &str = "REPLAY_CONCURRENCY";

/// Settings for a replay run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayOptions {
    /// Directory searched recursively for log files
    pub root: PathBuf,

    /// File name suffix identifying log files
    pub suffix: String,

    /// Number of concurrent workers
    pub concurrency: usize,

    /// Scan and report only; never connect to the engine
    pub dry: bool,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data"),
            suffix: WAL_SUFFIX.to_string(),
            concurrency: 8,
            dry: false,
        }
    }
}

/// A file that contributed to the worklist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub records: usize,
    pub malformed: usize,
    pub truncated: bool,
}

/// Records from every discovered file, flattened in traversal order
#[derive(Debug, Default)]
pub struct Worklist {
    pub files: Vec<ScannedFile>,
    pub records: Vec<WalRecord>,
}

impl Worklist {
    /// Entries dropped because their payload did not parse
    pub fn malformed(&self) -> usize {
        self.files.iter().map(|f| f.malformed).sum()
    }
}

/// Totals reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub files: usize,
    pub entries: usize,
    pub sent: usize,
    pub skipped: usize,
    pub errors: usize,
    pub elapsed: Duration,
}

/// Result of [`Replayer::execute`]
#[derive(Debug)]
pub enum ReplayOutcome {
    /// Dry run: the scanned worklist, nothing sent
    Scanned(Worklist),

    /// Entries were dispatched to the engine
    Replayed(ReplaySummary),
}

#[derive(Default)]
struct Counters {
    sent: AtomicUsize,
    skipped: AtomicUsize,
    errors: AtomicUsize,
}

/// WAL replay coordinator
pub struct Replayer {
    options: ReplayOptions,
}

impl Replayer {
    pub fn new(options: ReplayOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReplayOptions {
        &self.options
    }

    /// Discover and decode every log file under the root
    ///
    /// This is the only step that can fail a run; a missing root simply
    /// produces an empty worklist.
    pub async fn scan(&self) -> Result<Worklist> {
        let root = self.options.root.clone();
        let suffix = self.options.suffix.clone();

        tokio::task::spawn_blocking(move || build_worklist(&root, &suffix))
            .await
            .map_err(|e| WireError::Replay(format!("scan task failed: {}", e)))?
    }

    /// Dispatch a worklist through the client
    ///
    /// Never fails: per-entry problems are counted and logged.
    pub async fn replay(&self, client: Arc<EngineClient>, worklist: Worklist) -> ReplaySummary {
        let start = Instant::now();
        let files = worklist.files.len();
        let entries = worklist.records.len();

        let records = Arc::new(worklist.records);
        let cursor = Arc::new(AtomicUsize::new(0));
        let counters = Arc::new(Counters::default());

        let mut workers = JoinSet::new();
        for worker in 0..self.options.concurrency.max(1) {
            let client = Arc::clone(&client);
            let records = Arc::clone(&records);
            let cursor = Arc::clone(&cursor);
            let counters = Arc::clone(&counters);

            workers.spawn(async move {
                run_worker(worker, &client, &records, &cursor, &counters).await;
            });
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("replay worker aborted: {}", e);
            }
        }

        let summary = ReplaySummary {
            files,
            entries,
            sent: counters.sent.load(Ordering::Relaxed),
            skipped: counters.skipped.load(Ordering::Relaxed),
            errors: counters.errors.load(Ordering::Relaxed),
            elapsed: start.elapsed(),
        };

        tracing::info!(
            sent = summary.sent,
            skipped = summary.skipped,
            errors = summary.errors,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "replay finished"
        );
        summary
    }

    /// Scan then replay
    pub async fn run(&self, client: Arc<EngineClient>) -> Result<ReplaySummary> {
        let worklist = self.scan().await?;
        Ok(self.replay(client, worklist).await)
    }

    /// Scan, then replay through a client built by `connect` unless this is
    /// a dry run
    ///
    /// `connect` runs only after a successful scan and never on a dry run.
    pub async fn execute<F>(&self, connect: F) -> Result<ReplayOutcome>
    where
        F: FnOnce() -> Result<EngineClient>,
    {
        let worklist = self.scan().await?;
        if self.options.dry {
            tracing::info!(
                files = worklist.files.len(),
                entries = worklist.records.len(),
                malformed = worklist.malformed(),
                "dry run, nothing sent"
            );
            return Ok(ReplayOutcome::Scanned(worklist));
        }

        let client = Arc::new(connect()?);
        Ok(ReplayOutcome::Replayed(self.replay(client, worklist).await))
    }
}

/// Read every WAL file under `root` into one worklist
pub fn build_worklist(root: &Path, suffix: &str) -> Result<Worklist> {
    let paths = discover_wal_files(root, suffix)?;
    tracing::info!(root = %root.display(), files = paths.len(), "discovered WAL files");

    let mut worklist = Worklist::default();
    for path in paths {
        let scan = WalReader::open(&path)?.scan();
        tracing::info!(
            file = %path.strip_prefix(root).unwrap_or(&path).display(),
            entries = scan.records.len(),
            "scanned WAL file"
        );

        worklist.files.push(ScannedFile {
            path,
            records: scan.records.len(),
            malformed: scan.malformed,
            truncated: scan.truncated,
        });
        worklist.records.extend(scan.records);
    }

    tracing::info!(entries = worklist.records.len(), "total WAL entries");
    Ok(worklist)
}

async fn run_worker(
    worker: usize,
    client: &EngineClient,
    records: &[WalRecord],
    cursor: &AtomicUsize,
    counters: &Counters,
) {
    loop {
        let index = cursor.fetch_add(1, Ordering::Relaxed);
        let Some(record) = records.get(index) else {
            return;
        };

        let Some(command) = record.to_command() else {
            counters.skipped.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(worker, entry = index, record = %record.raw(), "skipping unhandled WAL entry");
            continue;
        };

        match client.send_command(&command).await {
            Ok(_) => {
                counters.sent.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                let failures = counters.errors.fetch_add(1, Ordering::Relaxed) + 1;
                if failures <= MAX_LOGGED_ERRORS {
                    tracing::error!(worker, entry = index, action = %command.action, "send error: {}", e);
                }
            }
        }
    }
}
