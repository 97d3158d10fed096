//! Scanner module for directory listing and file hashing.
//!
//! This module provides functionality for:
//! - Listing the direct entries of one directory (no recursion)
//! - Streaming file content through a pluggable digest function
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Single-directory listing and file discovery
//! - [`hasher`]: Digest functions (SHA-256, BLAKE3, CRC32) and the streaming file hasher
//!
//! # Example
//!
//! ```no_run
//! use rmdupes::scanner::{DirectoryScanner, Hasher, Sha256Base64};
//! use std::path::Path;
//!
//! let scanner = DirectoryScanner::new(Path::new("."));
//! let hasher = Hasher::new(Sha256Base64);
//!
//! for entry in scanner.scan().unwrap() {
//!     let file = entry.unwrap();
//!     let hashed = hasher.hash_file(&file.path).unwrap();
//!     println!("{}: {}", file.path.display(), hashed.digest);
//! }
//! ```

pub mod hasher;
pub mod walker;

use std::path::{Path, PathBuf};

// Re-export main types
pub use hasher::{
    Blake3Digest, Crc32Digest, DigestAlgorithm, DigestFunction, HashedContent, Hasher,
    Sha256Base64, DEFAULT_READ_BUFFER_SIZE, MAX_READ_BUFFER_SIZE,
};
pub use walker::DirectoryScanner;

/// A non-directory entry discovered by the [`DirectoryScanner`].
///
/// Only the path is recorded: content is read later by exactly one
/// digest worker, which takes ownership of the entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileEntry {
    /// Path to the file (root directory joined with the entry name)
    pub path: PathBuf,
}

impl FileEntry {
    /// Create a new FileEntry.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

/// Errors that can occur while listing the directory.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when listing the directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while reading the directory listing.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error raised for `path`.
    pub(crate) fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found (removed after it was listed).
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Hashing was abandoned because another stage failed.
    #[error("Hashing aborted: {0}")]
    Aborted(PathBuf),
}

impl HashError {
    /// Classify an I/O error raised while opening or streaming `path`.
    pub(crate) fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Path of the file that failed to hash.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::Aborted(p)
            | Self::Io { path: p, .. } => p,
        }
    }
}
