use rmdupes::duplicates::{DuplicateRemover, PipelineError, RemoverConfig};
use rmdupes::progress::ProgressCallback;
use rmdupes::scanner::{DigestFunction, HashError, Sha256Base64};
use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::tempdir;

/// Digest that fails on any content starting with `POISON`.
struct PoisonedDigest;

impl DigestFunction for PoisonedDigest {
    type Digest = String;

    fn name(&self) -> &'static str {
        "poisoned"
    }

    fn digest(&self, reader: &mut dyn BufRead) -> io::Result<String> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        if content.starts_with("POISON") {
            return Err(io::Error::other("simulated read failure"));
        }
        Ok(content)
    }
}

/// Digest that streams 4 KiB every 50 ms and fails 200 ms into any content
/// starting with `POISON`.
struct SlowDigest;

impl DigestFunction for SlowDigest {
    type Digest = usize;

    fn name(&self) -> &'static str {
        "slow"
    }

    fn digest(&self, reader: &mut dyn BufRead) -> io::Result<usize> {
        let mut total = 0;
        loop {
            let chunk = reader.fill_buf()?;
            if chunk.is_empty() {
                return Ok(total);
            }
            if total == 0 && chunk.starts_with(b"POISON") {
                thread::sleep(Duration::from_millis(200));
                return Err(io::Error::other("simulated read failure"));
            }
            let len = chunk.len().min(4096);
            reader.consume(len);
            total += len;
            thread::sleep(Duration::from_millis(50));
        }
    }
}

/// Digest that gives every file the same digest. Content `VANISH:<name>`
/// makes it delete `<name>` from `dir` after a delay, so the later removal
/// of that duplicate fails.
struct SelfDeletingDigest {
    dir: PathBuf,
}

impl DigestFunction for SelfDeletingDigest {
    type Digest = &'static str;

    fn name(&self) -> &'static str {
        "self-deleting"
    }

    fn digest(&self, reader: &mut dyn BufRead) -> io::Result<&'static str> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        if let Some(name) = content.strip_prefix("VANISH:") {
            thread::sleep(Duration::from_millis(500));
            fs::remove_file(self.dir.join(name))?;
        }
        Ok("D")
    }
}

#[derive(Default)]
struct RecordingProgress {
    hashed: AtomicUsize,
    removed: Mutex<Vec<String>>,
    finished: AtomicUsize,
}

impl ProgressCallback for RecordingProgress {
    fn on_file_hashed(&self, _path: &Path, _bytes: u64) {
        self.hashed.fetch_add(1, Ordering::SeqCst);
    }

    fn on_duplicate_removed(&self, path: &Path, _bytes: u64) {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        self.removed.lock().unwrap().push(name);
    }

    fn on_finish(&self) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_read_failure_aborts_run() {
    let dir = tempdir().unwrap();
    for i in 0..40 {
        fs::write(dir.path().join(format!("f{i:02}")), format!("{}", i % 2)).unwrap();
    }
    fs::write(dir.path().join("bad"), "POISON pill").unwrap();

    let result = DuplicateRemover::default().run(dir.path(), PoisonedDigest);

    match result {
        Err(PipelineError::Hash(HashError::Io { path, source })) => {
            assert!(path.ends_with("bad"));
            assert_eq!(source.to_string(), "simulated read failure");
        }
        other => panic!("Expected a hash failure, got {:?}", other),
    }
    // The failing file itself is never deleted.
    assert!(dir.path().join("bad").exists());
}

#[test]
fn test_read_failure_abandons_files_in_flight() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("big"), vec![b'x'; 400 * 1024]).unwrap();
    fs::write(dir.path().join("poison"), "POISON").unwrap();

    let remover = DuplicateRemover::new(RemoverConfig::default().with_workers(2));
    let start = Instant::now();
    let result = remover.run(dir.path(), SlowDigest);
    let elapsed = start.elapsed();

    match result {
        Err(PipelineError::Hash(HashError::Io { path, .. })) => assert!(path.ends_with("poison")),
        other => panic!("Expected a hash failure, got {:?}", other),
    }
    // Hashing "big" to the end takes about 5 seconds.
    assert!(elapsed < Duration::from_secs(3), "run took {:?}", elapsed);
    assert!(dir.path().join("big").exists());
}

#[test]
fn test_read_failure_with_single_worker() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("only"), "POISON").unwrap();

    let remover = DuplicateRemover::new(
        RemoverConfig::default()
            .with_workers(1)
            .with_queue_capacity(1),
    );
    let result = remover.run(dir.path(), PoisonedDigest);

    assert!(matches!(result, Err(PipelineError::Hash(_))));
}

#[test]
fn test_repeated_failures_report_one_error() {
    let dir = tempdir().unwrap();
    for i in 0..20 {
        fs::write(dir.path().join(format!("bad{i}")), "POISON").unwrap();
    }

    let result = DuplicateRemover::default().run(dir.path(), PoisonedDigest);

    let err = result.unwrap_err();
    assert_eq!(err.category(), "read");
    assert!(err.path().unwrap().starts_with(dir.path()));
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_fatal() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let locked = dir.path().join("locked");
    fs::write(&locked, "secret").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users can read the file anyway.
    if fs::File::open(&locked).is_ok() {
        return;
    }

    let result = DuplicateRemover::default().run(dir.path(), Sha256Base64);

    assert!(matches!(
        result,
        Err(PipelineError::Hash(HashError::PermissionDenied(_)))
    ));
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
}

#[cfg(unix)]
#[test]
fn test_delete_failure_aborts_and_keeps_earlier_deletions() {
    let dir = tempdir().unwrap();
    for i in 0..3 {
        fs::write(dir.path().join(format!("dup{i}")), "same").unwrap();
    }
    fs::write(dir.path().join("late"), "VANISH:late").unwrap();

    let progress = Arc::new(RecordingProgress::default());
    let remover = DuplicateRemover::new(
        RemoverConfig::default()
            .with_workers(5)
            .with_progress_callback(progress.clone()),
    );
    let result = remover.run(
        dir.path(),
        SelfDeletingDigest {
            dir: dir.path().to_path_buf(),
        },
    );

    let err = result.unwrap_err();
    assert!(matches!(err, PipelineError::Delete(_)), "got {:?}", err);
    assert_eq!(err.category(), "deletion");
    assert!(err.path().unwrap().ends_with("late"));

    // The two duplicates removed before the failure stay removed.
    let removed = progress.removed.lock().unwrap();
    assert_eq!(removed.len(), 2);
    for name in removed.iter() {
        assert!(!dir.path().join(name).exists());
    }
    let survivors = (0..3)
        .filter(|i| dir.path().join(format!("dup{i}")).exists())
        .count();
    assert_eq!(survivors, 1);
}

#[test]
fn test_progress_callback_sees_every_event() {
    let dir = tempdir().unwrap();
    for i in 0..12 {
        fs::write(dir.path().join(format!("f{i:02}")), format!("{}", i % 4)).unwrap();
    }

    let progress = Arc::new(RecordingProgress::default());
    let remover = DuplicateRemover::new(
        RemoverConfig::default().with_progress_callback(progress.clone()),
    );
    let summary = remover.run(dir.path(), Sha256Base64).unwrap();

    assert_eq!(progress.hashed.load(Ordering::SeqCst), 12);
    assert_eq!(progress.finished.load(Ordering::SeqCst), 1);

    let removed = progress.removed.lock().unwrap();
    assert_eq!(removed.len(), summary.deleted_files);
    for name in removed.iter() {
        assert!(!dir.path().join(name).exists());
    }
}

#[test]
fn test_progress_finishes_on_failure() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("bad"), "POISON").unwrap();

    let progress = Arc::new(RecordingProgress::default());
    let remover = DuplicateRemover::new(
        RemoverConfig::default().with_progress_callback(progress.clone()),
    );

    assert!(remover.run(dir.path(), PoisonedDigest).is_err());
    assert_eq!(progress.finished.load(Ordering::SeqCst), 1);
}
