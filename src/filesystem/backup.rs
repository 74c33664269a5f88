// src/filesystem/backup.rs

//! Timestamped tar.gz snapshots of package-manager state
//!
//! A backup is written to a temp file inside the backup root and renamed into
//! place once the archive is complete, so an interrupted run never leaves a
//! truncated `.tar.gz` behind. Two backups within the same second get a
//! numeric suffix instead of overwriting each other.

use super::FsError;
use chrono::Utc;
use flate2::Compression as GzLevel;
use flate2::write::GzEncoder;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Archive `source` (a file or directory) into `backup_root`
///
/// The archive is named `<basename>-<YYYYMMDD-HHMMSS>.tar.gz` using the
/// current UTC time. Directory entries are stored relative to `source`;
/// a single file is stored under its own base name. Symlinks are recorded
/// as links, not followed.
pub fn create_backup(
    backup_root: impl AsRef<Path>,
    source: impl AsRef<Path>,
) -> Result<PathBuf, FsError> {
    let backup_root = backup_root.as_ref();
    let source = source.as_ref();

    let metadata = fs::symlink_metadata(source).map_err(|e| FsError::io(source, e))?;

    let base = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| FsError::UnsafePath {
            path: source.to_path_buf(),
            reason: "has no base name".to_string(),
        })?;

    fs::create_dir_all(backup_root).map_err(|e| FsError::io(backup_root, e))?;

    let stamp = Utc::now().format("%Y%m%d-%H%M%S").to_string();

    debug!("Backing up {} into {}", source.display(), backup_root.display());

    let temp = NamedTempFile::new_in(backup_root).map_err(|e| FsError::io(backup_root, e))?;
    let encoder = GzEncoder::new(temp, GzLevel::default());
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);

    if metadata.is_dir() {
        builder
            .append_dir_all(".", source)
            .map_err(|e| FsError::io(source, e))?;
    } else {
        builder
            .append_path_with_name(source, &base)
            .map_err(|e| FsError::io(source, e))?;
    }

    let encoder = builder.into_inner().map_err(|e| FsError::io(backup_root, e))?;
    let mut temp = encoder.finish().map_err(|e| FsError::io(backup_root, e))?;
    temp.as_file().sync_all().map_err(|e| FsError::io(backup_root, e))?;

    let mut attempt = 0u32;
    loop {
        let target = backup_root.join(backup_name(&base, &stamp, attempt));
        match temp.persist_noclobber(&target) {
            Ok(_) => {
                info!("Created backup {}", target.display());
                return Ok(target);
            }
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                debug!("{} already exists, trying next suffix", target.display());
                temp = e.file;
                attempt += 1;
            }
            Err(e) => return Err(FsError::io(&target, e.error)),
        }
    }
}

fn backup_name(base: &str, stamp: &str, attempt: u32) -> String {
    if attempt == 0 {
        format!("{}-{}.tar.gz", base, stamp)
    } else {
        format!("{}-{}-{}.tar.gz", base, stamp, attempt)
    }
}

/// Ordering key of a backup file name made by [`create_backup`] for `base`
fn backup_key(file_name: &str, base: &str) -> Option<(String, u32)> {
    let rest = file_name
        .strip_prefix(base)?
        .strip_prefix('-')?
        .strip_suffix(".tar.gz")?;

    let (stamp, suffix) = match rest.get(15..) {
        Some("") => (rest, 0),
        Some(tail) => (&rest[..15], tail.strip_prefix('-')?.parse().ok()?),
        None => return None,
    };

    let valid = stamp.len() == 15
        && stamp.as_bytes()[8] == b'-'
        && stamp
            .bytes()
            .enumerate()
            .all(|(i, b)| i == 8 || b.is_ascii_digit());
    valid.then(|| (stamp.to_string(), suffix))
}

/// Delete all but the newest `keep` backups of `source` in `backup_root`
///
/// Only files named like [`create_backup`] output for the same base name are
/// considered. Returns how many archives were removed.
pub fn prune_backups(
    backup_root: impl AsRef<Path>,
    source: impl AsRef<Path>,
    keep: usize,
) -> Result<usize, FsError> {
    let backup_root = backup_root.as_ref();
    let source = source.as_ref();

    let Some(base) = source.file_name().map(|n| n.to_string_lossy().into_owned()) else {
        return Ok(0);
    };

    let mut backups = Vec::new();
    for entry in fs::read_dir(backup_root).map_err(|e| FsError::io(backup_root, e))? {
        let entry = entry.map_err(|e| FsError::io(backup_root, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(key) = backup_key(&name, &base) {
            backups.push((key, entry.path()));
        }
    }

    backups.sort_by(|a, b| b.0.cmp(&a.0));

    let mut removed = 0;
    for (_, path) in backups.into_iter().skip(keep) {
        fs::remove_file(&path).map_err(|e| FsError::io(&path, e))?;
        debug!("Removed old backup {}", path.display());
        removed += 1;
    }
    Ok(removed)
}
