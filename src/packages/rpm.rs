// src/packages/rpm.rs

//! RPM package support
//!
//! Metadata comes from `rpm -qip` plus the capability queries; when the rpm
//! binary is missing the header is parsed in-process with the `rpm` crate.
//! Install and remove are both followed by an `rpm -q` check.

use super::handle::{Native, PackageHandle};
use super::traits::Package;
use crate::command::args;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::format::PackageFormat;
use crate::parsers::PackageMetadata;
use crate::parsers::rpm::{parse_capabilities, parse_query};
use std::ffi::OsString;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info, info_span, warn};

/// A `.rpm` file on disk
pub struct RpmPackage {
    handle: PackageHandle,
}

/// RPM lead magic
fn is_rpm(header: &[u8]) -> bool {
    header.starts_with(&[0xed, 0xab, 0xee, 0xdb])
}

impl RpmPackage {
    /// Open and validate a `.rpm` file
    pub fn open(path: impl AsRef<Path>, ctx: &Context) -> Result<Self> {
        let handle = PackageHandle::open(path.as_ref(), PackageFormat::Rpm, ctx, is_rpm)?;
        Ok(Self { handle })
    }

    fn load_metadata(handle: &PackageHandle) -> Result<PackageMetadata> {
        let rpm = &handle.ctx().config().tools.rpm;
        let path = handle.path_arg();
        let native = handle.native();

        let report = match native.run_checked(rpm, &[OsString::from("-qip"), path.clone()]) {
            Ok(stdout) => stdout,
            Err(e) if e.is_missing_program() => {
                debug!("{} not available, parsing RPM header directly", rpm);
                return Self::read_header(handle.path());
            }
            Err(e) => return Err(native.subprocess_error("failed to query package", e)),
        };

        let mut meta = parse_query(&report)?;

        // The capability queries are best-effort
        let query = |flags: &[&str]| {
            let mut query_args = args(flags);
            query_args.push(path.clone());
            match native.run_checked(rpm, &query_args) {
                Ok(stdout) => parse_capabilities(&stdout),
                Err(e) => {
                    debug!("rpm {} failed: {}", flags.join(" "), e);
                    Vec::new()
                }
            }
        };

        meta.dependencies = query(&["-qpR"]);
        meta.provides = query(&["-qp", "--provides"]);
        meta.conflicts = query(&["-qp", "--conflicts"]);

        debug!(
            "Queried RPM: {} version {} ({} dependencies)",
            meta.name,
            meta.version,
            meta.dependencies.len()
        );
        Ok(meta)
    }

    /// Parse the package header with the `rpm` crate
    fn read_header(path: &Path) -> Result<PackageMetadata> {
        let file = File::open(path).map_err(|e| {
            Error::not_found(PackageFormat::Rpm, format!("failed to open {}", path.display()))
                .with_source(e)
        })?;

        let mut buf_reader = BufReader::new(file);

        let pkg = rpm::Package::parse(&mut buf_reader).map_err(|e| {
            Error::parse(PackageFormat::Rpm, "failed to parse RPM header").with_source(e)
        })?;

        let name = pkg.metadata.get_name().map_err(|e| {
            Error::parse(PackageFormat::Rpm, "failed to get package name").with_source(e)
        })?;

        let version = pkg.metadata.get_version().map_err(|e| {
            Error::parse(PackageFormat::Rpm, "failed to get package version").with_source(e)
        })?;

        let version = match pkg.metadata.get_release() {
            Ok(release) if !release.is_empty() => format!("{}-{}", version, release),
            _ => version.to_string(),
        };

        let summary = pkg.metadata.get_summary().unwrap_or_default();
        let body = pkg.metadata.get_description().unwrap_or_default();
        let description = match (summary.is_empty(), body.is_empty()) {
            (false, false) => format!("{}\n{}", summary, body),
            (false, true) => summary.to_string(),
            _ => body.to_string(),
        };

        // Same filtering as `rpm -qpR` output: no rpmlib() features or paths
        let keep = |name: &str| !name.starts_with("rpmlib(") && !name.starts_with('/');
        let names = |deps: Vec<rpm::Dependency>| -> Vec<String> {
            let mut out: Vec<String> = Vec::new();
            for dep in deps {
                if keep(&dep.name) && !out.contains(&dep.name) {
                    out.push(dep.name);
                }
            }
            out
        };

        let size = pkg
            .metadata
            .get_file_entries()
            .map(|entries| entries.iter().map(|entry| entry.size as u64).sum())
            .unwrap_or(0);

        Ok(PackageMetadata {
            name: name.to_string(),
            version,
            architecture: pkg.metadata.get_arch().unwrap_or_default().to_string(),
            description,
            maintainer: pkg
                .metadata
                .get_vendor()
                .ok()
                .filter(|v| !v.is_empty())
                .map(str::to_string),
            homepage: pkg
                .metadata
                .get_url()
                .ok()
                .filter(|u| !u.is_empty())
                .map(str::to_string),
            size,
            dependencies: names(pkg.metadata.get_requires().unwrap_or_default()),
            provides: names(pkg.metadata.get_provides().unwrap_or_default()),
            conflicts: names(pkg.metadata.get_conflicts().unwrap_or_default()),
            license: pkg.metadata.get_license().unwrap_or_default().to_string(),
            ..PackageMetadata::default()
        })
    }
}

/// Whether `rpm -q` reports `name` as installed, failing if rpm cannot run
fn query_installed(native: &Native, name: &str) -> Result<bool> {
    let rpm = &native.ctx().config().tools.rpm;
    let output = native
        .run(rpm, &args(["-q", name]))
        .map_err(|e| native.subprocess_error("failed to query installed packages", e))?;
    Ok(output.is_success())
}

pub(crate) fn is_installed(native: &Native, name: &str) -> bool {
    native.query_succeeds(&native.ctx().config().tools.rpm, &args(["-q", name]))
}

/// Erase an installed package by name and confirm it is gone
pub(crate) fn remove_named(native: &Native, name: &str, purge: bool) -> Result<()> {
    let rpm = &native.ctx().config().tools.rpm;
    let mut remove_args = args(["-e"]);
    if !purge {
        remove_args.push("--nodeps".into());
    }
    remove_args.push(name.into());

    native
        .run_checked(rpm, &remove_args)
        .map_err(|e| native.subprocess_error("removal failed", e))?;

    if query_installed(native, name)? {
        return Err(Error::verification(
            PackageFormat::Rpm,
            format!("package {} still installed after removal", name),
        ));
    }
    Ok(())
}

impl Package for RpmPackage {
    fn install(&mut self, force: bool) -> Result<()> {
        let _span = info_span!(parent: self.handle.ctx().span(), "install", format = "rpm").entered();
        self.handle.native().require_superuser("installation")?;

        info!("Installing RPM package: {}", self.handle.path().display());
        self.handle.native().backup_state();

        let rpm = self.handle.ctx().config().tools.rpm.clone();
        let mut install_args = args(["-i"]);
        if force {
            install_args.extend(args(["--force", "--nodeps"]));
        }
        install_args.push(self.handle.path_arg());

        self.handle
            .native()
            .run_checked(&rpm, &install_args)
            .map_err(|e| self.handle.native().subprocess_error("installation failed", e))?;

        match self.handle.resolve_name(Self::load_metadata) {
            Ok(name) => {
                if !query_installed(self.handle.native(), &name)? {
                    return Err(Error::verification(
                        PackageFormat::Rpm,
                        format!("package {} not reported installed after installation", name),
                    ));
                }
            }
            Err(e) => warn!("Skipping post-install verification: {}", e),
        }

        info!("Package installed successfully");
        Ok(())
    }

    fn remove(&mut self, purge: bool) -> Result<()> {
        let _span = info_span!(parent: self.handle.ctx().span(), "remove", format = "rpm").entered();
        self.handle.native().require_superuser("removal")?;

        let name = self.handle.resolve_name(Self::load_metadata)?;
        info!("Removing RPM package: {}", name);
        self.handle.native().backup_state();

        remove_named(self.handle.native(), &name, purge)?;

        info!("Package removed successfully");
        Ok(())
    }

    fn info(&mut self) -> Result<&PackageMetadata> {
        let _span = info_span!(parent: self.handle.ctx().span(), "info", format = "rpm").entered();
        self.handle.info_with(Self::load_metadata)
    }

    fn format(&self) -> PackageFormat {
        PackageFormat::Rpm
    }

    fn display_name(&self) -> String {
        match self.handle.metadata() {
            Some(meta) => format!("{}-{}.rpm", meta.name, meta.version),
            None => self.handle.file_name(),
        }
    }

    fn path(&self) -> &Path {
        self.handle.path()
    }

    fn verify_signature(&self) -> Result<()> {
        let rpm = &self.handle.ctx().config().tools.rpm;
        self.handle
            .native()
            .run_checked(rpm, &[OsString::from("-K"), self.handle.path_arg()])
            .map_err(|e| self.handle.native().signature_error(e))?;
        Ok(())
    }
}
