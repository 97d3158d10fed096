//! Permanent removal of duplicate files.
//!
//! # Overview
//!
//! [`remove_duplicate`] unlinks one file and classifies any failure into a
//! [`DeleteError`]. A failed removal is fatal for the run; removals that
//! already succeeded are never rolled back.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (removed by someone else after it was hashed).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) | Self::Io { path: p, .. } => p,
        }
    }

    fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// Permanently delete a single duplicate file.
///
/// **WARNING**: This operation cannot be undone.
///
/// # Errors
///
/// - `NotFound` if the file no longer exists
/// - `PermissionDenied` if deletion is not allowed
/// - `Io` for any other failure
pub fn remove_duplicate(path: &Path) -> Result<(), DeleteError> {
    fs::remove_file(path).map_err(|e| {
        log::error!("Failed to delete {}: {}", path.display(), e);
        DeleteError::from_io(path, e)
    })?;

    log::debug!("Deleted duplicate: {}", path.display());
    Ok(())
}
