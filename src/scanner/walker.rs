//! Single-directory scanner built on walkdir.
//!
//! # Overview
//!
//! [`DirectoryScanner`] lists the direct entries of one directory and yields
//! a [`FileEntry`] for every entry that is not itself a directory. Entries are
//! produced lazily, in the order the operating system returns them; nothing
//! is sorted and subdirectories are never descended into.
//!
//! Entry types come from the directory entry itself (links are not followed),
//! and no file is ever opened here.
//!
//! # Example
//!
//! ```no_run
//! use rmdupes::scanner::DirectoryScanner;
//! use std::path::Path;
//!
//! let scanner = DirectoryScanner::new(Path::new("/home/user/Downloads"));
//! for entry in scanner.scan().unwrap() {
//!     match entry {
//!         Ok(file) => println!("{}", file.path.display()),
//!         Err(e) => eprintln!("Listing failed: {}", e),
//!     }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{FileEntry, ScanError};

/// Lists the non-directory entries of one directory.
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    /// Directory to list
    root: PathBuf,
}

impl DirectoryScanner {
    /// Create a new scanner for the given directory.
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            root: path.to_path_buf(),
        }
    }

    /// Check that the root exists and is a directory.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::NotFound`], [`ScanError::PermissionDenied`],
    /// [`ScanError::NotADirectory`] or [`ScanError::Io`].
    pub fn validate(&self) -> Result<(), ScanError> {
        let metadata = fs::metadata(&self.root).map_err(|e| ScanError::from_io(&self.root, e))?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory(self.root.clone()));
        }
        Ok(())
    }

    /// Validate the root and return the lazy entry sequence.
    ///
    /// The returned iterator yields every direct non-directory entry once and
    /// then ends. A listing failure part-way through is yielded as an `Err`;
    /// callers treat it as fatal.
    ///
    /// # Errors
    ///
    /// Returns a [`ScanError`] if the root cannot be listed at all.
    pub fn scan(
        &self,
    ) -> Result<impl Iterator<Item = Result<FileEntry, ScanError>> + '_, ScanError> {
        self.validate()?;
        log::debug!("Listing {}", self.root.display());

        let entries = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .into_iter();

        Ok(entries.filter_map(move |entry| match entry {
            Ok(entry) => {
                if entry.file_type().is_dir() {
                    log::trace!("Skipping directory: {}", entry.path().display());
                    return None;
                }
                Some(Ok(FileEntry::new(entry.into_path())))
            }
            Err(e) => Some(Err(self.handle_walk_error(e))),
        }))
    }

    fn handle_walk_error(&self, error: walkdir::Error) -> ScanError {
        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);
        log::debug!("Listing error for {}: {}", path.display(), error);
        match error.into_io_error() {
            Some(io_error) => ScanError::from_io(&path, io_error),
            None => ScanError::Io {
                path,
                source: std::io::Error::other("directory listing failed"),
            },
        }
    }
}
