// src/packages/eopkg.rs

//! Solus package support
//!
//! `.eopkg` files are zip archives holding `metadata.xml`, `files.xml` and
//! the payload; older tooling produced gzip-compressed tarballs instead.
//! Both framings are read in-process.

use super::handle::{Native, PackageHandle};
use super::traits::Package;
use crate::command::args;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::filesystem::{Compression, read_member};
use crate::format::PackageFormat;
use crate::parsers::PackageMetadata;
use crate::parsers::solus::parse_metadata_xml;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info, info_span};

const METADATA_MEMBER: &str = "metadata.xml";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// A `.eopkg` file on disk
pub struct EopkgPackage {
    handle: PackageHandle,
}

fn is_eopkg(header: &[u8]) -> bool {
    header.starts_with(ZIP_MAGIC) || Compression::sniff(header) == Compression::Gzip
}

impl EopkgPackage {
    /// Open and validate a `.eopkg` file
    pub fn open(path: impl AsRef<Path>, ctx: &Context) -> Result<Self> {
        let handle = PackageHandle::open(path.as_ref(), PackageFormat::Solus, ctx, is_eopkg)?;
        Ok(Self { handle })
    }

    fn load_metadata(handle: &PackageHandle) -> Result<PackageMetadata> {
        let xml = Self::read_metadata_xml(handle)?;
        parse_metadata_xml(&xml)
    }

    fn read_metadata_xml(handle: &PackageHandle) -> Result<String> {
        let path = handle.path();
        let compression = Compression::sniff_file(path)
            .map_err(|e| handle.native().archive_error("failed to read package", e))?;

        let file = File::open(path).map_err(|e| {
            Error::not_found(PackageFormat::Solus, format!("failed to open {}", path.display()))
                .with_source(e)
        })?;

        let content = if compression == Compression::Gzip {
            debug!("Reading {} from gzip tarball", METADATA_MEMBER);
            let reader = compression
                .decoder(BufReader::new(file))
                .map_err(|e| handle.native().archive_error("failed to open package archive", e))?;
            read_member(reader, METADATA_MEMBER)
                .map_err(|e| handle.native().archive_error("failed to read package archive", e))?
        } else {
            debug!("Reading {} from zip archive", METADATA_MEMBER);
            Self::read_zip_member(file, METADATA_MEMBER)?
        };

        let content = content.ok_or_else(|| {
            Error::parse(
                PackageFormat::Solus,
                format!("{} not found in package", METADATA_MEMBER),
            )
        })?;

        Ok(String::from_utf8_lossy(&content).into_owned())
    }

    fn read_zip_member(file: File, name: &str) -> Result<Option<Vec<u8>>> {
        let mut archive = zip::ZipArchive::new(BufReader::new(file)).map_err(|e| {
            Error::parse(PackageFormat::Solus, "failed to open zip archive").with_source(e)
        })?;

        let mut entry = match archive.by_name(name) {
            Ok(entry) => entry,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(e) => {
                return Err(
                    Error::parse(PackageFormat::Solus, format!("failed to read {}", name))
                        .with_source(e),
                );
            }
        };

        let mut content = Vec::new();
        entry.read_to_end(&mut content).map_err(|e| {
            Error::parse(PackageFormat::Solus, format!("failed to read {}", name)).with_source(e)
        })?;
        Ok(Some(content))
    }
}

/// Remove an installed package by name
pub(crate) fn remove_named(native: &Native, name: &str, purge: bool) -> Result<()> {
    let eopkg = &native.ctx().config().tools.eopkg;
    let mut remove_args = args(["remove"]);
    if purge {
        remove_args.push("--purge".into());
    }
    remove_args.push(name.into());

    native
        .run_checked(eopkg, &remove_args)
        .map_err(|e| native.subprocess_error("removal failed", e))?;

    if purge {
        native.follow_up(eopkg, &args(["delete-cache"]), "clean package cache");
    }
    Ok(())
}

/// `eopkg info` also describes repository packages; only an
/// "Installed package" section means it is on the system
pub(crate) fn is_installed(native: &Native, name: &str) -> bool {
    let eopkg = &native.ctx().config().tools.eopkg;
    match native.run_checked(eopkg, &args(["info", name])) {
        Ok(report) => report.contains("Installed package"),
        Err(e) => {
            debug!("{}", e);
            false
        }
    }
}

impl Package for EopkgPackage {
    fn install(&mut self, force: bool) -> Result<()> {
        let _span =
            info_span!(parent: self.handle.ctx().span(), "install", format = "eopkg").entered();
        self.handle.native().require_superuser("installation")?;

        info!("Installing Eopkg package: {}", self.handle.path().display());
        self.handle.native().backup_state();

        let eopkg = &self.handle.ctx().config().tools.eopkg;
        let mut install_args = args(["install"]);
        if force {
            install_args.extend(args(["--ignore-dependency", "--ignore-safety"]));
        }
        install_args.push(self.handle.path_arg());

        self.handle
            .native()
            .run_checked(eopkg, &install_args)
            .map_err(|e| self.handle.native().subprocess_error("installation failed", e))?;

        self.handle.native().follow_up(
            eopkg,
            &args(["index", "--rebuild-db"]),
            "rebuild package database",
        );

        info!("Package installed successfully");
        Ok(())
    }

    fn remove(&mut self, purge: bool) -> Result<()> {
        let _span =
            info_span!(parent: self.handle.ctx().span(), "remove", format = "eopkg").entered();
        self.handle.native().require_superuser("removal")?;

        let name = self.handle.resolve_name(Self::load_metadata)?;
        info!("Removing Eopkg package: {}", name);
        self.handle.native().backup_state();

        remove_named(self.handle.native(), &name, purge)?;

        info!("Package removed successfully");
        Ok(())
    }

    fn info(&mut self) -> Result<&PackageMetadata> {
        let _span = info_span!(parent: self.handle.ctx().span(), "info", format = "eopkg").entered();
        self.handle.info_with(Self::load_metadata)
    }

    fn format(&self) -> PackageFormat {
        PackageFormat::Solus
    }

    fn display_name(&self) -> String {
        match self.handle.metadata() {
            Some(meta) => format!("{}-{}.eopkg", meta.name, meta.version),
            None => self.handle.file_name(),
        }
    }

    fn path(&self) -> &Path {
        self.handle.path()
    }
}
