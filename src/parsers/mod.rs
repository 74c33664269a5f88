// src/parsers/mod.rs

//! Package metadata parsers for the supported formats
//!
//! Each format reports the same information in its own dialect:
//! - Debian: `dpkg-deb -f` control fields (`Key: value`, folded description)
//! - RPM: `rpm -qip` query output (`Key : value`)
//! - Solus: `metadata.xml` inside the `.eopkg`
//! - Arch: `.PKGINFO` (`key = value`)
//! - Alpine: `.PKGINFO` (`key=value`)
//!
//! Every parser is a pure function from text to [`PackageMetadata`]. Optional
//! fields degrade gracefully; a missing name or version is a parse failure.

pub mod alpine;
pub mod arch;
pub mod debian;
pub mod rpm;
pub mod solus;

use crate::error::{Error, Result};
use crate::format::PackageFormat;
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

/// Normalized package metadata shared by every format
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageMetadata {
    /// Package name
    pub name: String,

    /// Package version, including release/revision where the format has one
    pub version: String,

    /// Architecture (amd64, x86_64, noarch, any, ...)
    pub architecture: String,

    /// Description, may span several lines
    pub description: String,

    pub maintainer: Option<String>,

    pub homepage: Option<String>,

    /// Size in bytes, best-effort
    pub size: u64,

    /// Runtime dependencies, names only
    pub dependencies: Vec<String>,

    pub conflicts: Vec<String>,

    pub provides: Vec<String>,

    pub replaces: Vec<String>,

    /// Build date when the format records one, otherwise extraction time
    pub install_date: DateTime<Utc>,

    /// Empty when the format has no license field
    pub license: String,

    /// Empty when the format has no section/group
    pub section: String,

    /// Debian only, empty elsewhere
    pub priority: String,
}

impl Default for PackageMetadata {
    fn default() -> Self {
        Self {
            name: String::new(),
            version: String::new(),
            architecture: String::new(),
            description: String::new(),
            maintainer: None,
            homepage: None,
            size: 0,
            dependencies: Vec::new(),
            conflicts: Vec::new(),
            provides: Vec::new(),
            replaces: Vec::new(),
            install_date: Utc::now(),
            license: String::new(),
            section: String::new(),
            priority: String::new(),
        }
    }
}

impl PackageMetadata {
    /// Reject records that cannot identify a package
    fn require_identity(self, format: PackageFormat) -> Result<Self> {
        if self.name.is_empty() {
            return Err(Error::parse(format, "package name is missing"));
        }
        if self.version.is_empty() {
            return Err(Error::parse(
                format,
                format!("version is missing for package {}", self.name),
            ));
        }
        Ok(self)
    }
}

/// Parse metadata text in the dialect of `format`
pub fn parse(format: PackageFormat, text: &str) -> Result<PackageMetadata> {
    match format {
        PackageFormat::Debian => debian::parse_control(text),
        PackageFormat::Rpm => rpm::parse_query(text),
        PackageFormat::Solus => solus::parse_metadata_xml(text),
        PackageFormat::Arch => arch::parse_pkginfo(text),
        PackageFormat::Alpine => alpine::parse_pkginfo(text),
        PackageFormat::Unknown => Err(Error::unsupported("no parser for unknown package format")),
    }
}

/// Blank and `#` comment lines carry no fields
fn is_ignorable(line: &str) -> bool {
    line.is_empty() || line.starts_with('#')
}

/// Cut a version constraint off a dependency (`foo>=1.0` -> `foo`)
fn strip_constraint(dep: &str) -> &str {
    let end = dep.find(['<', '>', '=']).unwrap_or(dep.len());
    dep[..end].trim()
}

/// Parse a unix timestamp; malformed or out-of-range values yield `None`
fn parse_epoch(value: &str) -> Option<DateTime<Utc>> {
    let secs: i64 = value.trim().parse().ok()?;
    Utc.timestamp_opt(secs, 0).single()
}

/// Keep a non-empty value as `Some`
fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
