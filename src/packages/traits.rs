// src/packages/traits.rs

//! Common interface for all package formats

use crate::error::{Error, ErrorKind, Result};
use crate::format::PackageFormat;
use crate::parsers::PackageMetadata;
use std::path::Path;

/// Operations every package format supports (deb, rpm, eopkg, pacman, apk)
///
/// Mutating operations require superuser privileges and fail with
/// `PermissionDenied` before touching anything else. Metadata is read at
/// most once per instance and cached.
pub trait Package {
    /// Install the package with the native tool
    ///
    /// `force` maps to the tool's "ignore dependencies/safety" flags.
    fn install(&mut self, force: bool) -> Result<()>;

    /// Remove the installed package named by this file's metadata
    ///
    /// `purge` also strips configuration, caches or orphaned dependencies,
    /// depending on what the native tool offers.
    fn remove(&mut self, purge: bool) -> Result<()>;

    /// Package metadata, loaded on first call and cached
    fn info(&mut self) -> Result<&PackageMetadata>;

    /// Format of this package
    fn format(&self) -> PackageFormat;

    /// Canonical file name once metadata is known, else the file's base name
    fn display_name(&self) -> String;

    /// Absolute path of the package file
    fn path(&self) -> &Path;

    /// Check the package signature with the native tool
    fn verify_signature(&self) -> Result<()> {
        Err(Error::new(
            ErrorKind::Unsupported,
            self.format(),
            format!("signature verification is not available for {} packages", self.format()),
        ))
    }
}
