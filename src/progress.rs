//! Progress reporting utilities using indicatif.
//!
//! This module provides the [`Progress`] struct which implements
//! [`ProgressCallback`] to display a spinner while the pipeline runs.
//!
//! The callbacks are invoked from the digest workers (concurrently) and from
//! the deduplicator, so implementations must be `Send + Sync`.

use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Progress callback for the deduplication pipeline.
pub trait ProgressCallback: Send + Sync {
    /// Called by a digest worker after a file has been fully hashed.
    ///
    /// # Arguments
    ///
    /// * `path` - File that was hashed
    /// * `bytes` - Number of bytes streamed through the digest
    fn on_file_hashed(&self, path: &Path, bytes: u64);

    /// Called by the deduplicator after a duplicate has been removed.
    fn on_duplicate_removed(&self, path: &Path, bytes: u64);

    /// Called once when the run ends, successfully or not.
    fn on_finish(&self) {}
}

/// Spinner reporter using indicatif.
pub struct Progress {
    bar: ProgressBar,
    hashed: AtomicUsize,
    removed: AtomicUsize,
    bytes_hashed: AtomicU64,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, nothing is drawn.
    ///
    /// # Examples
    ///
    /// ```
    /// use rmdupes::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
            );
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        };
        Self {
            bar,
            hashed: AtomicUsize::new(0),
            removed: AtomicUsize::new(0),
            bytes_hashed: AtomicU64::new(0),
        }
    }

    /// Number of files hashed so far.
    #[must_use]
    pub fn files_hashed(&self) -> usize {
        self.hashed.load(Ordering::Relaxed)
    }

    /// Number of duplicates removed so far.
    #[must_use]
    pub fn duplicates_removed(&self) -> usize {
        self.removed.load(Ordering::Relaxed)
    }

    fn refresh(&self) {
        if self.bar.is_hidden() {
            return;
        }
        self.bar.set_message(format!(
            "hashed {} files ({}), removed {} duplicates",
            self.files_hashed(),
            bytesize::ByteSize(self.bytes_hashed.load(Ordering::Relaxed)),
            self.duplicates_removed()
        ));
    }
}

impl ProgressCallback for Progress {
    fn on_file_hashed(&self, _path: &Path, bytes: u64) {
        self.hashed.fetch_add(1, Ordering::Relaxed);
        self.bytes_hashed.fetch_add(bytes, Ordering::Relaxed);
        self.refresh();
    }

    fn on_duplicate_removed(&self, _path: &Path, _bytes: u64) {
        self.removed.fetch_add(1, Ordering::Relaxed);
        self.refresh();
    }

    fn on_finish(&self) {
        self.bar.finish_and_clear();
    }
}
