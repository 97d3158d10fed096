//! Pipeline orchestrator.
//!
//! [`DuplicateRemover`] validates the directory, creates the three bounded
//! queues and starts the stages:
//!
//! ```text
//! scanner ──paths──▶ N digest workers ──digests──▶ deduplicator ──done──▶ caller
//!     └──────────────────────┴──── first error ─────────┘
//! ```
//!
//! It then waits for whichever comes first: the deduplicator's completion
//! count or the first fatal error. All stage threads are joined before
//! [`DuplicateRemover::run`] returns.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use crossbeam_channel::{bounded, select, Receiver, Sender};
use serde::{Serialize, Serializer};

use super::dedup::{DedupStats, Deduplicator};
use super::failure::FailFast;
use super::pool::{build_pool, run_pool};
use super::{DigestedFile, PipelineError};
use crate::progress::ProgressCallback;
use crate::scanner::{
    Blake3Digest, Crc32Digest, DigestAlgorithm, DigestFunction, DirectoryScanner, FileEntry,
    Hasher, ScanError, Sha256Base64, DEFAULT_READ_BUFFER_SIZE, MAX_READ_BUFFER_SIZE,
};

/// Default number of digest workers.
pub const DEFAULT_WORKERS: usize = 10;

/// Default capacity of each inter-stage queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 50;

/// Configuration for a removal run.
#[derive(Clone)]
pub struct RemoverConfig {
    /// Number of concurrent digest workers
    pub workers: usize,
    /// Capacity of the path queue and the digest queue
    pub queue_capacity: usize,
    /// Read buffer size per worker, in bytes
    pub read_buffer_size: usize,
    /// Optional progress callback
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl fmt::Debug for RemoverConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoverConfig")
            .field("workers", &self.workers)
            .field("queue_capacity", &self.queue_capacity)
            .field("read_buffer_size", &self.read_buffer_size)
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

impl Default for RemoverConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            progress_callback: None,
        }
    }
}

impl RemoverConfig {
    /// Set the number of digest workers (at least one).
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the capacity of both queues (at least one).
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Set the per-worker read buffer size, clamped to
    /// `1..=MAX_READ_BUFFER_SIZE`.
    #[must_use]
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.clamp(1, MAX_READ_BUFFER_SIZE);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Digest function used
    pub algorithm: String,
    /// Files hashed by the worker pool
    pub files_hashed: usize,
    /// Files kept (one per distinct digest)
    pub unique_files: usize,
    /// Files deleted as duplicates
    pub deleted_files: usize,
    /// Bytes freed by the deletions
    pub bytes_reclaimed: u64,
    /// Wall-clock duration of the run
    #[serde(rename = "duration_secs", serialize_with = "serialize_secs")]
    pub duration: Duration,
}

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

impl RunSummary {
    fn from_stats(algorithm: &str, stats: DedupStats, duration: Duration) -> Self {
        Self {
            algorithm: algorithm.to_string(),
            files_hashed: stats.files_processed,
            unique_files: stats.unique_files,
            deleted_files: stats.deleted_files,
            bytes_reclaimed: stats.bytes_reclaimed,
            duration,
        }
    }
}

/// Removes duplicate files from a single directory.
#[derive(Debug, Clone, Default)]
pub struct DuplicateRemover {
    config: RemoverConfig,
}

impl DuplicateRemover {
    /// Create a remover with the given configuration.
    #[must_use]
    pub fn new(config: RemoverConfig) -> Self {
        Self { config }
    }

    /// Run with the digest function selected by `algorithm`.
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    pub fn run_with_algorithm(
        &self,
        path: &Path,
        algorithm: DigestAlgorithm,
    ) -> Result<RunSummary, PipelineError> {
        if !algorithm.is_collision_resistant() {
            log::warn!(
                "{} is not collision resistant; different files sharing a checksum will be deleted",
                algorithm
            );
        }
        match algorithm {
            DigestAlgorithm::Sha256 => self.run(path, Sha256Base64),
            DigestAlgorithm::Blake3 => self.run(path, Blake3Digest),
            DigestAlgorithm::Crc32 => self.run(path, Crc32Digest),
        }
    }

    /// Delete every file in `path` whose content digest was already seen.
    ///
    /// Exactly one file per distinct digest survives; which one is not
    /// specified. Subdirectories are left alone.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error from any stage. Files deleted before
    /// the failure stay deleted. If the directory cannot be listed, no file
    /// is read or deleted.
    pub fn run<D: DigestFunction>(
        &self,
        path: &Path,
        function: D,
    ) -> Result<RunSummary, PipelineError> {
        let start = Instant::now();
        let workers = self.config.workers.max(1);
        let capacity = self.config.queue_capacity.max(1);
        let algorithm = function.name();

        let scanner = DirectoryScanner::new(path);
        let entries = scanner.scan()?;
        let pool = build_pool(workers)?;
        let hasher = Hasher::new(function).with_buffer_size(self.config.read_buffer_size);

        log::info!(
            "Removing duplicates in {} ({} workers, {}, queue capacity {}, {} read buffer)",
            path.display(),
            workers,
            algorithm,
            capacity,
            ByteSize(hasher.buffer_size() as u64)
        );

        let failure = FailFast::new();
        let (path_tx, path_rx) = bounded::<FileEntry>(capacity);
        let (digest_tx, digest_rx) = bounded::<DigestedFile<D::Digest>>(capacity);
        let (done_tx, done_rx) = bounded::<DedupStats>(1);
        let progress = self.config.progress_callback.as_deref();

        let outcome = thread::scope(|s| {
            let failure = &failure;
            let hasher = &hasher;
            let pool = &pool;

            s.spawn(move || feed_paths(entries, path_tx, failure));
            s.spawn(move || {
                run_pool(pool, workers, hasher, path_rx, digest_tx, failure, progress)
            });
            s.spawn(move || {
                let stats = Deduplicator::new()
                    .with_progress(progress)
                    .run(digest_rx, failure);
                if let Some(stats) = stats {
                    let _ = done_tx.send(stats);
                }
            });

            wait_for_outcome(&done_rx, failure)
        });

        if let Some(progress) = progress {
            progress.on_finish();
        }

        let stats = outcome?;
        let summary = RunSummary::from_stats(algorithm, stats, start.elapsed());
        log::info!(
            "Deleted {} of {} files in {:.2?}",
            summary.deleted_files,
            summary.files_hashed,
            summary.duration
        );
        Ok(summary)
    }
}

/// Scanner stage: push every listed file onto the path queue, then close it.
fn feed_paths(
    entries: impl Iterator<Item = Result<FileEntry, ScanError>>,
    paths: Sender<FileEntry>,
    failure: &FailFast,
) -> usize {
    let mut sent = 0;
    for entry in entries {
        if failure.is_tripped() {
            break;
        }
        match entry {
            Ok(file) => {
                if paths.send(file).is_err() {
                    break;
                }
                sent += 1;
            }
            Err(e) => {
                failure.signal(PipelineError::Scan(e));
                break;
            }
        }
    }
    log::debug!("Scanner queued {} files", sent);
    sent
}

/// Wait for the deduplicator's totals or the first error, whichever comes first.
fn wait_for_outcome(
    done: &Receiver<DedupStats>,
    failure: &FailFast,
) -> Result<DedupStats, PipelineError> {
    select! {
        recv(done) -> stats => match stats {
            Ok(stats) => Ok(stats),
            // The deduplicator only withholds its totals after a failure.
            Err(_) if failure.is_tripped() => Err(failure.wait()),
            Err(_) => Err(PipelineError::Aborted),
        },
        recv(failure.receiver()) -> error => Err(error.unwrap_or(PipelineError::Aborted)),
    }
}
