use rmdupes::duplicates::{DuplicateRemover, PipelineError, RemoverConfig};
use rmdupes::scanner::{Blake3Digest, Crc32Digest, DigestAlgorithm, ScanError, Sha256Base64};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;

fn write(dir: &Path, name: &str, content: &[u8]) {
    File::create(dir.join(name))
        .unwrap()
        .write_all(content)
        .unwrap();
}

/// Contents of the regular files left directly in `dir`.
fn surviving_contents(dir: &Path) -> Vec<Vec<u8>> {
    let mut contents: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.is_file())
        .map(|p| fs::read(p).unwrap())
        .collect();
    contents.sort();
    contents
}

#[test]
fn test_distinct_files_are_untouched() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"content a");
    write(dir.path(), "b.txt", b"content b");
    write(dir.path(), "c.txt", b"content c");

    let summary = DuplicateRemover::default()
        .run(dir.path(), Sha256Base64)
        .unwrap();

    assert_eq!(summary.deleted_files, 0);
    assert_eq!(summary.unique_files, 3);
    assert_eq!(surviving_contents(dir.path()).len(), 3);
}

#[test]
fn test_hello_world_example() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a", b"hello");
    write(dir.path(), "b", b"hello");
    write(dir.path(), "c", b"world");

    let summary = DuplicateRemover::default()
        .run(dir.path(), Sha256Base64)
        .unwrap();

    assert_eq!(summary.deleted_files, 1);
    assert!(dir.path().join("c").exists());
    let kept_hello = ["a", "b"]
        .iter()
        .filter(|name| dir.path().join(name).exists())
        .count();
    assert_eq!(kept_hello, 1);
}

#[test]
fn test_copies_and_distinct_files() {
    let dir = tempdir().unwrap();
    // 4 copies of one content, 3 copies of another, 5 distinct files
    for i in 0..4 {
        write(dir.path(), &format!("alpha{i}"), b"alpha alpha");
    }
    for i in 0..3 {
        write(dir.path(), &format!("beta{i}"), b"beta");
    }
    for i in 0..5 {
        write(dir.path(), &format!("unique{i}"), format!("unique {i}").as_bytes());
    }

    let summary = DuplicateRemover::default()
        .run(dir.path(), Blake3Digest)
        .unwrap();

    assert_eq!(summary.files_hashed, 12);
    assert_eq!(summary.deleted_files, 3 + 2);
    assert_eq!(summary.unique_files, 7);
    assert_eq!(summary.bytes_reclaimed, 3 * 11 + 2 * 4);

    let contents = surviving_contents(dir.path());
    let distinct: HashSet<_> = contents.iter().cloned().collect();
    assert_eq!(contents.len(), 7);
    assert_eq!(distinct.len(), 7);
}

#[test]
fn test_second_run_deletes_nothing() {
    let dir = tempdir().unwrap();
    for i in 0..10 {
        write(dir.path(), &format!("f{i}"), format!("{}", i % 4).as_bytes());
    }

    let remover = DuplicateRemover::default();
    let first = remover.run(dir.path(), Sha256Base64).unwrap();
    let second = remover.run(dir.path(), Sha256Base64).unwrap();

    assert_eq!(first.deleted_files, 6);
    assert_eq!(second.deleted_files, 0);
    assert_eq!(second.files_hashed, 4);
}

#[test]
fn test_empty_directory() {
    let dir = tempdir().unwrap();

    let summary = DuplicateRemover::default()
        .run(dir.path(), Sha256Base64)
        .unwrap();

    assert_eq!(summary.deleted_files, 0);
    assert_eq!(summary.files_hashed, 0);
}

#[test]
fn test_subdirectories_are_left_alone() {
    let dir = tempdir().unwrap();
    write(dir.path(), "top.txt", b"shared");
    let sub = dir.path().join("nested");
    fs::create_dir(&sub).unwrap();
    write(&sub, "inner1.txt", b"shared");
    write(&sub, "inner2.txt", b"shared");

    let summary = DuplicateRemover::default()
        .run(dir.path(), Sha256Base64)
        .unwrap();

    assert_eq!(summary.deleted_files, 0);
    assert!(dir.path().join("top.txt").exists());
    assert!(sub.join("inner1.txt").exists());
    assert!(sub.join("inner2.txt").exists());
}

#[test]
fn test_empty_files_are_duplicates_of_each_other() {
    let dir = tempdir().unwrap();
    File::create(dir.path().join("empty1")).unwrap();
    File::create(dir.path().join("empty2")).unwrap();
    File::create(dir.path().join("empty3")).unwrap();
    write(dir.path(), "full", b"x");

    let summary = DuplicateRemover::default()
        .run(dir.path(), Sha256Base64)
        .unwrap();

    assert_eq!(summary.deleted_files, 2);
    assert_eq!(summary.bytes_reclaimed, 0);
    assert!(dir.path().join("full").exists());
}

#[test]
fn test_nonexistent_directory_fails() {
    let result =
        DuplicateRemover::default().run(Path::new("/non/existent/path/12345"), Sha256Base64);

    match result {
        Err(PipelineError::Scan(ScanError::NotFound(path))) => {
            assert!(path.to_string_lossy().contains("12345"));
        }
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

#[test]
fn test_file_instead_of_directory_fails_without_deleting() {
    let dir = tempdir().unwrap();
    let file_path = dir.path().join("file.txt");
    write(dir.path(), "file.txt", b"content");

    let result = DuplicateRemover::default().run(&file_path, Sha256Base64);

    assert!(matches!(
        result,
        Err(PipelineError::Scan(ScanError::NotADirectory(_)))
    ));
    assert!(file_path.exists());
}

#[test]
fn test_all_algorithms_agree_on_outcome() {
    for algorithm in [
        DigestAlgorithm::Sha256,
        DigestAlgorithm::Blake3,
        DigestAlgorithm::Crc32,
    ] {
        let dir = tempdir().unwrap();
        for i in 0..9 {
            write(dir.path(), &format!("f{i}"), format!("group {}", i % 3).as_bytes());
        }

        let summary = DuplicateRemover::default()
            .run_with_algorithm(dir.path(), algorithm)
            .unwrap();

        assert_eq!(summary.deleted_files, 6, "algorithm {algorithm}");
        assert_eq!(summary.algorithm, algorithm.to_string());
        assert_eq!(surviving_contents(dir.path()).len(), 3);
    }
}

#[test]
fn test_many_files_with_backpressure() {
    let dir = tempdir().unwrap();
    for i in 0..500 {
        write(dir.path(), &format!("file{i:03}"), format!("{}", i % 25).as_bytes());
    }

    let remover = DuplicateRemover::new(
        RemoverConfig::default()
            .with_workers(4)
            .with_queue_capacity(2)
            .with_read_buffer_size(3),
    );
    let summary = remover.run(dir.path(), Crc32Digest).unwrap();

    assert_eq!(summary.files_hashed, 500);
    assert_eq!(summary.deleted_files, 475);
    assert_eq!(surviving_contents(dir.path()).len(), 25);
}

#[test]
fn test_large_file_streams_fully() {
    let dir = tempdir().unwrap();
    let content: Vec<u8> = (0..3_000_000u32).map(|i| (i % 253) as u8).collect();
    write(dir.path(), "big1", &content);
    write(dir.path(), "big2", &content);
    let mut different = content.clone();
    if let Some(last) = different.last_mut() {
        *last ^= 0xFF;
    }
    write(dir.path(), "big3", &different);

    let summary = DuplicateRemover::default()
        .run(dir.path(), Sha256Base64)
        .unwrap();

    assert_eq!(summary.deleted_files, 1);
    assert_eq!(summary.bytes_reclaimed, content.len() as u64);
    assert!(dir.path().join("big3").exists());
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_hashed_through_their_target() {
    let dir = tempdir().unwrap();
    let outside = tempdir().unwrap();
    write(outside.path(), "target", b"linked content");
    write(dir.path(), "real", b"linked content");
    std::os::unix::fs::symlink(outside.path().join("target"), dir.path().join("link")).unwrap();

    let summary = DuplicateRemover::default()
        .run(dir.path(), Sha256Base64)
        .unwrap();

    // One of `real` and `link` goes; removing the link never touches its target.
    assert_eq!(summary.deleted_files, 1);
    assert!(outside.path().join("target").exists());
}
