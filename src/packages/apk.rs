// src/packages/apk.rs

//! Alpine package support
//!
//! An `.apk` is several gzip members concatenated back to back (signature,
//! control, data). Decoded as one stream they form a single tarball whose
//! `.PKGINFO` member carries the metadata.

use super::handle::{Native, PackageHandle};
use super::traits::Package;
use crate::command::args;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::filesystem::{Compression, read_member};
use crate::format::PackageFormat;
use crate::parsers::PackageMetadata;
use crate::parsers::alpine::parse_pkginfo;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info, info_span};

/// A `.apk` file on disk
pub struct ApkPackage {
    handle: PackageHandle,
}

fn is_apk(header: &[u8]) -> bool {
    Compression::sniff(header) == Compression::Gzip
}

impl ApkPackage {
    /// Open and validate an Alpine package
    pub fn open(path: impl AsRef<Path>, ctx: &Context) -> Result<Self> {
        let handle = PackageHandle::open(path.as_ref(), PackageFormat::Alpine, ctx, is_apk)?;
        Ok(Self { handle })
    }

    fn load_metadata(handle: &PackageHandle) -> Result<PackageMetadata> {
        let path = handle.path();
        let file = File::open(path).map_err(|e| {
            Error::not_found(PackageFormat::Alpine, format!("failed to open {}", path.display()))
                .with_source(e)
        })?;
        let archive_len = file.metadata().map(|m| m.len()).unwrap_or(0);

        let reader = Compression::Gzip
            .decoder(BufReader::new(file))
            .map_err(|e| handle.native().archive_error("failed to open package archive", e))?;

        let pkginfo = read_member(reader, ".PKGINFO")
            .map_err(|e| handle.native().archive_error("failed to read package archive", e))?
            .ok_or_else(|| Error::parse(PackageFormat::Alpine, ".PKGINFO not found in package"))?;

        let mut meta = parse_pkginfo(&String::from_utf8_lossy(&pkginfo))?;

        if meta.size == 0 {
            debug!("No size in .PKGINFO, using archive size {}", archive_len);
            meta.size = archive_len;
        }

        Ok(meta)
    }
}

/// Remove an installed package by name
pub(crate) fn remove_named(native: &Native, name: &str, purge: bool) -> Result<()> {
    let apk = &native.ctx().config().tools.apk;
    let mut remove_args = args(["del"]);
    if purge {
        remove_args.push("--purge".into());
    }
    remove_args.push(name.into());

    native
        .run_checked(apk, &remove_args)
        .map_err(|e| native.subprocess_error("removal failed", e))?;
    Ok(())
}

pub(crate) fn is_installed(native: &Native, name: &str) -> bool {
    native.query_succeeds(&native.ctx().config().tools.apk, &args(["info", "-e", name]))
}

impl Package for ApkPackage {
    fn install(&mut self, force: bool) -> Result<()> {
        let _span = info_span!(parent: self.handle.ctx().span(), "install", format = "apk").entered();
        self.handle.native().require_superuser("installation")?;

        info!("Installing Alpine package: {}", self.handle.path().display());
        self.handle.native().backup_state();

        let apk = &self.handle.ctx().config().tools.apk;
        let mut install_args = args(["add"]);
        if force {
            install_args.push("--force-overwrite".into());
        }
        install_args.push(self.handle.path_arg());

        self.handle
            .native()
            .run_checked(apk, &install_args)
            .map_err(|e| self.handle.native().subprocess_error("installation failed", e))?;

        info!("Package installed successfully");
        Ok(())
    }

    fn remove(&mut self, purge: bool) -> Result<()> {
        let _span = info_span!(parent: self.handle.ctx().span(), "remove", format = "apk").entered();
        self.handle.native().require_superuser("removal")?;

        let name = self.handle.resolve_name(Self::load_metadata)?;
        info!("Removing Alpine package: {}", name);
        self.handle.native().backup_state();

        remove_named(self.handle.native(), &name, purge)?;

        info!("Package removed successfully");
        Ok(())
    }

    fn info(&mut self) -> Result<&PackageMetadata> {
        let _span = info_span!(parent: self.handle.ctx().span(), "info", format = "apk").entered();
        self.handle.info_with(Self::load_metadata)
    }

    fn format(&self) -> PackageFormat {
        PackageFormat::Alpine
    }

    fn display_name(&self) -> String {
        match self.handle.metadata() {
            Some(meta) => format!("{}-{}.apk", meta.name, meta.version),
            None => self.handle.file_name(),
        }
    }

    fn path(&self) -> &Path {
        self.handle.path()
    }
}
