// src/filesystem/archive.rs

//! Tar archive extraction and member lookup
//!
//! Extraction only materialises directories and regular files. Symlinks,
//! hard links, device nodes and fifos are skipped with a warning, and every
//! target path is validated before anything is written.

use super::path::entry_target;
use super::FsError;
use flate2::read::{GzDecoder, MultiGzDecoder};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Read};
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::Path;
use tar::{Archive, EntryType};
use tracing::{debug, warn};
use xz2::read::XzDecoder;

/// Compression framing around a tar stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    Xz,
    Zstd,
    None,
}

impl Compression {
    /// Identify the compression from the first bytes of a stream
    pub fn sniff(header: &[u8]) -> Self {
        if header.starts_with(&[0x1f, 0x8b]) {
            Compression::Gzip
        } else if header.starts_with(&[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00]) {
            Compression::Xz
        } else if header.starts_with(&[0x28, 0xb5, 0x2f, 0xfd]) {
            Compression::Zstd
        } else {
            Compression::None
        }
    }

    /// Identify the compression of a file by reading its magic bytes
    pub fn sniff_file(path: &Path) -> Result<Self, FsError> {
        let mut file = File::open(path).map_err(|e| FsError::io(path, e))?;
        let mut header = [0u8; 6];
        let n = read_up_to(&mut file, &mut header).map_err(|e| FsError::io(path, e))?;
        Ok(Self::sniff(&header[..n]))
    }

    /// Wrap `reader` in the matching decoder
    ///
    /// Gzip uses the multi-member decoder so concatenated streams (as in
    /// Alpine packages) read as one.
    pub fn decoder<'a, R: Read + 'a>(self, reader: R) -> Result<Box<dyn Read + 'a>, FsError> {
        let decoder: Box<dyn Read + 'a> = match self {
            Compression::Gzip => Box::new(MultiGzDecoder::new(reader)),
            Compression::Xz => Box::new(XzDecoder::new(reader)),
            Compression::Zstd => Box::new(
                zstd::Decoder::new(reader)
                    .map_err(|e| FsError::Archive(format!("failed to create zstd decoder: {}", e)))?,
            ),
            Compression::None => Box::new(reader),
        };
        Ok(decoder)
    }
}

fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

/// Extract a gzip-compressed tar archive into `dst`
pub fn extract_tar_gz(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Result<usize, FsError> {
    let src = src.as_ref();
    let file = File::open(src).map_err(|e| FsError::io(src, e))?;
    extract_tar(GzDecoder::new(BufReader::new(file)), dst.as_ref())
}

/// Extract an xz-compressed tar archive into `dst`
pub fn extract_tar_xz(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Result<usize, FsError> {
    let src = src.as_ref();
    let file = File::open(src).map_err(|e| FsError::io(src, e))?;
    extract_tar(XzDecoder::new(BufReader::new(file)), dst.as_ref())
}

/// Extract a decompressed tar stream, returning the number of files written
pub fn extract_tar<R: Read>(reader: R, dst: &Path) -> Result<usize, FsError> {
    fs::create_dir_all(dst).map_err(|e| FsError::io(dst, e))?;

    let mut archive = Archive::new(reader);
    let mut written = 0;

    for entry in archive
        .entries()
        .map_err(|e| FsError::Archive(format!("failed to read archive entries: {}", e)))?
    {
        let mut entry =
            entry.map_err(|e| FsError::Archive(format!("failed to read archive entry: {}", e)))?;

        let entry_path = entry
            .path()
            .map_err(|e| FsError::Archive(format!("failed to get entry path: {}", e)))?
            .into_owned();

        let target = entry_target(dst, &entry_path)?;
        let mode = entry.header().mode().unwrap_or(0o644) & 0o7777;

        match entry.header().entry_type() {
            EntryType::Directory => {
                fs::create_dir_all(&target).map_err(|e| FsError::io(&target, e))?;
                fs::set_permissions(&target, fs::Permissions::from_mode(mode | 0o700))
                    .map_err(|e| FsError::io(&target, e))?;
            }
            EntryType::Regular | EntryType::Continuous => {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent).map_err(|e| FsError::io(parent, e))?;
                }

                let mut out = OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .mode(mode)
                    .open(&target)
                    .map_err(|e| FsError::io(&target, e))?;

                io::copy(&mut entry, &mut out).map_err(|e| FsError::io(&target, e))?;
                written += 1;
            }
            other => {
                warn!(
                    "Skipping unsupported archive entry {} ({:?})",
                    entry_path.display(),
                    other
                );
            }
        }
    }

    debug!("Extracted {} files into {}", written, dst.display());
    Ok(written)
}

/// Read one member of a decompressed tar stream into memory
///
/// Names are compared with any leading `./` removed. Returns `Ok(None)`
/// when the member is absent.
pub fn read_member<R: Read>(reader: R, name: &str) -> Result<Option<Vec<u8>>, FsError> {
    let wanted = name.trim_start_matches("./");
    let mut archive = Archive::new(reader);

    for entry in archive
        .entries()
        .map_err(|e| FsError::Archive(format!("failed to read archive entries: {}", e)))?
    {
        let mut entry =
            entry.map_err(|e| FsError::Archive(format!("failed to read archive entry: {}", e)))?;

        let matches = {
            let entry_path = entry
                .path()
                .map_err(|e| FsError::Archive(format!("failed to get entry path: {}", e)))?;
            entry_path.to_string_lossy().trim_start_matches("./") == wanted
        };

        if matches && entry.header().entry_type().is_file() {
            let mut content = Vec::new();
            entry
                .read_to_end(&mut content)
                .map_err(|e| FsError::Archive(format!("failed to read {}: {}", wanted, e)))?;
            return Ok(Some(content));
        }
    }

    Ok(None)
}
