// src/filesystem/mod.rs

//! Archive, backup and file utilities
//!
//! Nothing in here knows about package formats. Package entities build on
//! these helpers for member extraction, hashing and pre-mutation backups.

pub mod archive;
pub mod backup;
pub mod copy;
pub mod hash;
pub mod path;

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub use archive::{Compression, extract_tar_gz, extract_tar_xz, read_member};
pub use backup::{create_backup, prune_backups};
pub use copy::atomic_copy;
pub use hash::sha256_file;
pub use path::validate_path;

/// Errors from the filesystem layer
#[derive(Error, Debug)]
pub enum FsError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{0} is not a regular file")]
    NotRegularFile(PathBuf),

    #[error("unsafe path {path}: {reason}")]
    UnsafePath { path: PathBuf, reason: String },

    #[error("archive error: {0}")]
    Archive(String),
}

impl FsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        FsError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the underlying cause is a missing file
    pub fn is_not_found(&self) -> bool {
        matches!(self, FsError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}
