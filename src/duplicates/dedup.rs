//! Sequential deduplication over a stream of digested files.
//!
//! The [`Deduplicator`] is the only owner of the registry that maps each
//! digest to the first file seen with it. Results arrive in completion order,
//! so which copy survives depends on worker timing; callers must not rely on
//! it.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;

use crossbeam_channel::Receiver;
use serde::Serialize;

use super::failure::FailFast;
use super::{DigestedFile, PipelineError};
use crate::actions::{remove_duplicate, DeleteError};
use crate::progress::ProgressCallback;
use crate::scanner::FileEntry;

/// Outcome for a single digested file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// First file with this digest: recorded as the representative.
    Kept,
    /// Digest already registered: the file was deleted.
    Removed,
}

/// Totals reported by a completed deduplicator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DedupStats {
    /// Digested files processed
    pub files_processed: usize,
    /// Distinct digests registered (one survivor each)
    pub unique_files: usize,
    /// Files deleted as duplicates
    pub deleted_files: usize,
    /// Bytes freed by the deletions
    pub bytes_reclaimed: u64,
}

/// Keeps one file per digest and deletes the rest.
pub struct Deduplicator<'a, K> {
    registry: HashMap<K, FileEntry>,
    files_processed: usize,
    deleted_files: usize,
    bytes_reclaimed: u64,
    progress: Option<&'a dyn ProgressCallback>,
}

impl<K> Default for Deduplicator<'_, K> {
    fn default() -> Self {
        Self {
            registry: HashMap::new(),
            files_processed: 0,
            deleted_files: 0,
            bytes_reclaimed: 0,
            progress: None,
        }
    }
}

impl<'a, K: Eq + Hash> Deduplicator<'a, K> {
    /// Create a deduplicator with an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Report removals to a progress callback.
    #[must_use]
    pub fn with_progress(mut self, progress: Option<&'a dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    /// Decide the fate of one digested file.
    ///
    /// The first file with a digest is recorded and kept. Any later file with
    /// the same digest is deleted immediately; the registry is unchanged.
    ///
    /// # Errors
    ///
    /// Returns a [`DeleteError`] if a duplicate cannot be removed. The file
    /// is not counted as deleted in that case.
    pub fn process(&mut self, file: DigestedFile<K>) -> Result<Decision, DeleteError> {
        self.files_processed += 1;
        match self.registry.entry(file.digest) {
            Entry::Vacant(slot) => {
                log::trace!("Keeping {}", file.entry.path.display());
                slot.insert(file.entry);
                Ok(Decision::Kept)
            }
            Entry::Occupied(slot) => {
                log::debug!(
                    "{} duplicates {}",
                    file.entry.path.display(),
                    slot.get().path.display()
                );
                remove_duplicate(&file.entry.path)?;
                self.deleted_files += 1;
                self.bytes_reclaimed += file.bytes;
                if let Some(progress) = self.progress {
                    progress.on_duplicate_removed(&file.entry.path, file.bytes);
                }
                Ok(Decision::Removed)
            }
        }
    }

    /// Current totals.
    #[must_use]
    pub fn stats(&self) -> DedupStats {
        DedupStats {
            files_processed: self.files_processed,
            unique_files: self.registry.len(),
            deleted_files: self.deleted_files,
            bytes_reclaimed: self.bytes_reclaimed,
        }
    }

    /// Consume results until the input closes.
    ///
    /// Returns the final totals, or `None` if the run failed (here or in
    /// another stage). A deletion failure is reported through `failure`.
    pub fn run(
        mut self,
        results: Receiver<DigestedFile<K>>,
        failure: &FailFast,
    ) -> Option<DedupStats> {
        for file in results.iter() {
            if failure.is_tripped() {
                log::debug!("Deduplicator stopping after pipeline failure");
                return None;
            }
            if let Err(e) = self.process(file) {
                failure.signal(PipelineError::Delete(e));
                return None;
            }
        }

        if failure.is_tripped() {
            return None;
        }
        let stats = self.stats();
        log::debug!(
            "Deduplicator done: {} files, {} unique, {} deleted",
            stats.files_processed,
            stats.unique_files,
            stats.deleted_files
        );
        Some(stats)
    }
}
