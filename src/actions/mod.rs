//! File actions module.
//!
//! The only action this tool performs on the file system is removing a
//! duplicate once the deduplicator has decided it is redundant. Removal is
//! permanent: there is no trash, no dry run and no undo.
//!
//! ```no_run
//! use rmdupes::actions::delete::remove_duplicate;
//! use std::path::Path;
//!
//! remove_duplicate(Path::new("/path/to/copy-of-photo.jpg")).unwrap();
//! ```

pub mod delete;

pub use delete::{remove_duplicate, DeleteError};
