//! Fixed-size pool of digest workers.
//!
//! Exactly `workers` long-lived loops run on a dedicated rayon pool. Each loop
//! takes paths from the shared bounded queue, hashes the file, and forwards
//! the result to the deduplicator. A path is taken by exactly one worker.
//!
//! The stage closes the digest queue only after every worker has returned,
//! so the deduplicator sees end-of-stream only once all results are in.

use crossbeam_channel::{Receiver, Sender};
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::failure::FailFast;
use super::{DigestedFile, PipelineError};
use crate::progress::ProgressCallback;
use crate::scanner::{DigestFunction, FileEntry, HashError, Hasher};

/// Build the rayon pool that hosts the digest workers.
///
/// # Errors
///
/// Returns [`PipelineError::ThreadPool`] if the threads cannot be spawned.
pub fn build_pool(workers: usize) -> Result<ThreadPool, PipelineError> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|i| format!("rmdupes-hasher-{i}"))
        .build()?;
    Ok(pool)
}

/// Run `workers` digest loops on `pool` and wait for all of them.
///
/// Takes ownership of both queue ends: `paths` is dropped once the workers
/// are done (unblocking the scanner if it is still sending), and `digests`
/// is dropped after the join barrier, closing the deduplicator's input.
///
/// Returns the number of files hashed.
pub fn run_pool<D: DigestFunction>(
    pool: &ThreadPool,
    workers: usize,
    hasher: &Hasher<D>,
    paths: Receiver<FileEntry>,
    digests: Sender<DigestedFile<D::Digest>>,
    failure: &FailFast,
    progress: Option<&dyn ProgressCallback>,
) -> usize {
    let workers = workers.max(1);
    let (counts_tx, counts_rx) = crossbeam_channel::bounded::<usize>(workers);

    pool.scope(|scope| {
        for id in 0..workers {
            let paths = &paths;
            let digests = digests.clone();
            let counts_tx = counts_tx.clone();
            scope.spawn(move |_| {
                let hashed = digest_worker(id, hasher, paths, &digests, failure, progress);
                let _ = counts_tx.send(hashed);
            });
        }
    });

    // Join barrier passed: no worker can produce another result.
    drop(digests);
    drop(paths);
    drop(counts_tx);

    let total: usize = counts_rx.try_iter().sum();
    log::debug!("All {} digest workers finished, {} files hashed", workers, total);
    total
}

/// One digest worker loop.
///
/// Runs until the path queue is closed and drained, the deduplicator goes
/// away, or a failure is reported. A file that cannot be opened or fully
/// read is reported as fatal and produces no result. A file being hashed
/// when another stage fails is abandoned at the next buffer refill.
pub fn digest_worker<D: DigestFunction>(
    id: usize,
    hasher: &Hasher<D>,
    paths: &Receiver<FileEntry>,
    digests: &Sender<DigestedFile<D::Digest>>,
    failure: &FailFast,
    progress: Option<&dyn ProgressCallback>,
) -> usize {
    let mut hashed = 0;

    while !failure.is_tripped() {
        let Ok(entry) = paths.recv() else {
            break;
        };
        if failure.is_tripped() {
            break;
        }

        let content = match hasher.hash_file_with_abort(&entry.path, || failure.is_tripped()) {
            Ok(content) => content,
            Err(HashError::Aborted(path)) => {
                log::debug!("Worker {}: abandoned {}", id, path.display());
                break;
            }
            Err(e) => {
                failure.signal(PipelineError::Hash(e));
                break;
            }
        };
        if failure.is_tripped() {
            break;
        }

        let file = DigestedFile::new(entry, content.digest, content.bytes);
        if let Some(progress) = progress {
            progress.on_file_hashed(file.path(), file.bytes);
        }
        if digests.send(file).is_err() {
            log::debug!("Worker {}: deduplicator is gone", id);
            break;
        }
        hashed += 1;
    }

    log::trace!("Worker {} exiting after {} files", id, hashed);
    hashed
}
