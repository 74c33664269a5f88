// src/filesystem/copy.rs

//! Crash-safe file copies
//!
//! Data is written to a temporary file in the destination directory and then
//! renamed over the destination. The rename is the only step that makes the
//! destination visible, so it is never observed half written.

use super::FsError;
use std::fs::{self, File, Permissions};
use std::io::{self, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Copy a regular file to `dst` atomically, preserving its permissions
pub fn atomic_copy(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Result<(), FsError> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    let metadata = fs::metadata(src).map_err(|e| FsError::io(src, e))?;
    if !metadata.is_file() {
        return Err(FsError::NotRegularFile(src.to_path_buf()));
    }

    let source = File::open(src).map_err(|e| FsError::io(src, e))?;
    write_atomic(source, dst, Some(metadata.permissions()))
}

/// Stream `reader` into `dst` through a sibling temp file and rename
///
/// On any error the temp file is removed and `dst` keeps whatever it held
/// before the call.
pub fn write_atomic<R: Read>(
    mut reader: R,
    dst: &Path,
    permissions: Option<Permissions>,
) -> Result<(), FsError> {
    let dir = match dst.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    // Dropping the NamedTempFile on an error path deletes it
    let mut temp = NamedTempFile::new_in(dir).map_err(|e| FsError::io(dir, e))?;

    io::copy(&mut reader, temp.as_file_mut()).map_err(|e| FsError::io(dst, e))?;
    temp.as_file_mut().flush().map_err(|e| FsError::io(dst, e))?;

    if let Some(permissions) = permissions {
        temp.as_file()
            .set_permissions(permissions)
            .map_err(|e| FsError::io(dst, e))?;
    }

    temp.as_file().sync_all().map_err(|e| FsError::io(dst, e))?;

    temp.persist(dst).map_err(|e| FsError::io(dst, e.error))?;
    Ok(())
}
