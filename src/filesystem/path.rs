// src/filesystem/path.rs

//! Path safety checks used before writing anything extracted from an archive

use super::FsError;
use std::path::{Component, Path, PathBuf};

/// Reject traversal sequences and require the resolved path to be rooted
pub fn validate_path(path: impl AsRef<Path>) -> Result<PathBuf, FsError> {
    let path = path.as_ref();

    if path
        .components()
        .any(|component| matches!(component, Component::ParentDir))
    {
        return Err(FsError::UnsafePath {
            path: path.to_path_buf(),
            reason: "contains a parent-directory sequence".to_string(),
        });
    }

    let absolute = std::path::absolute(path).map_err(|e| FsError::io(path, e))?;

    if !absolute.has_root() {
        return Err(FsError::UnsafePath {
            path: path.to_path_buf(),
            reason: "does not resolve to a rooted path".to_string(),
        });
    }

    Ok(absolute)
}

/// Map an archive entry name onto a location under `dest`
///
/// Leading `./` is dropped; absolute names and `..` are refused.
pub fn entry_target(dest: &Path, entry: &Path) -> Result<PathBuf, FsError> {
    let mut relative = PathBuf::new();

    for component in entry.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(FsError::UnsafePath {
                    path: entry.to_path_buf(),
                    reason: "escapes the extraction directory".to_string(),
                });
            }
        }
    }

    let target = validate_path(dest.join(&relative))?;
    Ok(target)
}
