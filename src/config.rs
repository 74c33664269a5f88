// src/config.rs

//! Runtime configuration
//!
//! Everything has a sensible default, so a missing config file is never an
//! error. A JSON file can override any subset of fields.

use crate::error::{Error, Result};
use crate::format::PackageFormat;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default location for backup archives
pub const DEFAULT_BACKUP_ROOT: &str = "/var/backups/unipkg";

/// Backups kept per state path unless configured otherwise
pub const DEFAULT_BACKUP_RETENTION: usize = 5;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory that receives every backup archive
    pub backup_root: PathBuf,
    /// Snapshot system state before mutating operations
    pub create_backups: bool,
    /// Backups kept per state path; older ones are pruned, 0 keeps all
    pub backup_retention: usize,
    /// Native tool program names or paths
    pub tools: Tools,
    /// System state backed up before each mutation, per format
    pub state: StatePaths,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backup_root: PathBuf::from(DEFAULT_BACKUP_ROOT),
            create_backups: true,
            backup_retention: DEFAULT_BACKUP_RETENTION,
            tools: Tools::default(),
            state: StatePaths::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading configuration from: {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::not_found(
                PackageFormat::Unknown,
                format!("failed to read config file {}", path.display()),
            )
            .with_source(e)
        })?;

        serde_json::from_str(&content).map_err(|e| {
            Error::validation(
                PackageFormat::Unknown,
                format!("invalid config file {}", path.display()),
            )
            .with_source(e)
        })
    }

    /// Use a different backup root
    pub fn with_backup_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.backup_root = root.into();
        self
    }
}

/// Native tool names
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Tools {
    pub dpkg: String,
    pub dpkg_deb: String,
    pub dpkg_sig: String,
    pub apt_get: String,
    pub rpm: String,
    pub eopkg: String,
    pub pacman: String,
    pub pacman_key: String,
    pub apk: String,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            dpkg: "dpkg".to_string(),
            dpkg_deb: "dpkg-deb".to_string(),
            dpkg_sig: "dpkg-sig".to_string(),
            apt_get: "apt-get".to_string(),
            rpm: "rpm".to_string(),
            eopkg: "eopkg".to_string(),
            pacman: "pacman".to_string(),
            pacman_key: "pacman-key".to_string(),
            apk: "apk".to_string(),
        }
    }
}

/// Package database locations owned by the native tools
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StatePaths {
    pub dpkg: PathBuf,
    pub rpm: PathBuf,
    pub eopkg: PathBuf,
    pub pacman: PathBuf,
    /// Alpine keeps its world file rather than a directory
    pub apk: PathBuf,
}

impl Default for StatePaths {
    fn default() -> Self {
        Self {
            dpkg: PathBuf::from("/var/lib/dpkg"),
            rpm: PathBuf::from("/var/lib/rpm"),
            eopkg: PathBuf::from("/var/lib/eopkg"),
            pacman: PathBuf::from("/var/lib/pacman"),
            apk: PathBuf::from("/etc/apk/world"),
        }
    }
}

impl StatePaths {
    /// State path for a format, if it has one
    pub fn for_format(&self, format: PackageFormat) -> Option<&Path> {
        match format {
            PackageFormat::Debian => Some(&self.dpkg),
            PackageFormat::Rpm => Some(&self.rpm),
            PackageFormat::Solus => Some(&self.eopkg),
            PackageFormat::Arch => Some(&self.pacman),
            PackageFormat::Alpine => Some(&self.apk),
            PackageFormat::Unknown => None,
        }
    }
}
