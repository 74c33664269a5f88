// src/filesystem/hash.rs

use super::FsError;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io;
use std::path::Path;

/// Stream a file through SHA-256 and return the lowercase hex digest
pub fn sha256_file(path: impl AsRef<Path>) -> Result<String, FsError> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|e| FsError::io(path, e))?;

    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(|e| FsError::io(path, e))?;

    Ok(format!("{:x}", hasher.finalize()))
}
