//! Duplicate removal pipeline.
//!
//! This module provides the three concurrent stages and their wiring:
//! - Directory scanning on its own thread, feeding a bounded path queue
//! - A fixed-size pool of digest workers ([`pool`])
//! - A single deduplicator that owns the digest registry ([`dedup`])
//! - The orchestrator that starts the stages and waits for the outcome ([`remover`])
//!
//! Any stage can report a fatal error through the shared [`failure::FailFast`]
//! channel; the first report ends the run.
//!
//! # Example
//!
//! ```no_run
//! use rmdupes::duplicates::{DuplicateRemover, RemoverConfig};
//! use rmdupes::scanner::Sha256Base64;
//! use std::path::Path;
//!
//! let remover = DuplicateRemover::new(RemoverConfig::default().with_workers(8));
//! let summary = remover.run(Path::new("/home/user/Downloads"), Sha256Base64).unwrap();
//! println!("Deleted a total of {} files.", summary.deleted_files);
//! ```

pub mod dedup;
pub mod failure;
pub mod pool;
pub mod remover;

use std::path::PathBuf;

use crate::actions::DeleteError;
use crate::scanner::{FileEntry, HashError, ScanError};

pub use dedup::{Decision, DedupStats, Deduplicator};
pub use failure::FailFast;
pub use remover::{
    DuplicateRemover, RemoverConfig, RunSummary, DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS,
};

/// A file together with the digest of its full content.
///
/// Produced once per file by exactly one digest worker and consumed once
/// by the deduplicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestedFile<D> {
    /// The scanned file
    pub entry: FileEntry,
    /// Digest of the content at the time it was read
    pub digest: D,
    /// Bytes streamed through the digest
    pub bytes: u64,
}

impl<D> DigestedFile<D> {
    /// Create a new digested file.
    #[must_use]
    pub fn new(entry: FileEntry, digest: D, bytes: u64) -> Self {
        Self {
            entry,
            digest,
            bytes,
        }
    }

    /// Path of the digested file.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.entry.path
    }
}

/// Fatal errors that end a run.
///
/// Every variant aborts the whole pipeline; deletions that already happened
/// are not undone.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// The directory could not be listed.
    #[error("Cannot list directory: {0}")]
    Scan(#[from] ScanError),

    /// A file could not be opened or fully read.
    #[error("Failed hashing: {0}")]
    Hash(#[from] HashError),

    /// A duplicate could not be removed.
    #[error("Failed deleting duplicate: {0}")]
    Delete(#[from] DeleteError),

    /// The digest worker pool could not be created.
    #[error("Failed to start digest workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A stage stopped without reporting a result or an error.
    #[error("Pipeline stage exited without reporting a result")]
    Aborted,
}

impl PipelineError {
    /// Short category name used in logs and structured error reports.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Scan(_) => "enumeration",
            Self::Hash(_) => "read",
            Self::Delete(_) => "deletion",
            Self::ThreadPool(_) | Self::Aborted => "internal",
        }
    }

    /// Path involved in the failure, if any.
    #[must_use]
    pub fn path(&self) -> Option<PathBuf> {
        match self {
            Self::Scan(ScanError::NotFound(p))
            | Self::Scan(ScanError::PermissionDenied(p))
            | Self::Scan(ScanError::NotADirectory(p))
            | Self::Scan(ScanError::Io { path: p, .. }) => Some(p.clone()),
            Self::Hash(e) => Some(e.path().to_path_buf()),
            Self::Delete(e) => Some(e.path().to_path_buf()),
            Self::ThreadPool(_) | Self::Aborted => None,
        }
    }
}
