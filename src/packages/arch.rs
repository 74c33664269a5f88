// src/packages/arch.rs

//! Arch Linux package support
//!
//! Arch packages are tarballs (`.pkg.tar.zst`, `.pkg.tar.xz`, `.pkg.tar.gz`)
//! with a `.PKGINFO` metadata member. The compression is sniffed from the
//! magic bytes rather than trusted from the file name.

use super::handle::{Native, PackageHandle};
use super::traits::Package;
use crate::command::args;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::filesystem::{Compression, read_member};
use crate::format::PackageFormat;
use crate::parsers::PackageMetadata;
use crate::parsers::arch::parse_pkginfo;
use std::ffi::OsString;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info, info_span};

/// A `.pkg.tar.*` file on disk
pub struct ArchPackage {
    handle: PackageHandle,
}

/// Arch packages may use any supported compression, or none
fn is_arch(header: &[u8]) -> bool {
    !header.is_empty()
}

impl ArchPackage {
    /// Open and validate an Arch package
    pub fn open(path: impl AsRef<Path>, ctx: &Context) -> Result<Self> {
        let handle = PackageHandle::open(path.as_ref(), PackageFormat::Arch, ctx, is_arch)?;
        Ok(Self { handle })
    }

    fn load_metadata(handle: &PackageHandle) -> Result<PackageMetadata> {
        let path = handle.path();
        let compression = Compression::sniff_file(path)
            .map_err(|e| handle.native().archive_error("failed to read package", e))?;
        debug!("Reading .PKGINFO from {:?} compressed package", compression);

        let file = File::open(path).map_err(|e| {
            Error::not_found(PackageFormat::Arch, format!("failed to open {}", path.display()))
                .with_source(e)
        })?;

        let reader = compression
            .decoder(BufReader::new(file))
            .map_err(|e| handle.native().archive_error("failed to open package archive", e))?;

        let pkginfo = read_member(reader, ".PKGINFO")
            .map_err(|e| handle.native().archive_error("failed to read package archive", e))?
            .ok_or_else(|| Error::parse(PackageFormat::Arch, ".PKGINFO not found in package"))?;

        parse_pkginfo(&String::from_utf8_lossy(&pkginfo))
    }
}

/// Remove an installed package by name
pub(crate) fn remove_named(native: &Native, name: &str, purge: bool) -> Result<()> {
    let pacman = &native.ctx().config().tools.pacman;
    let mut remove_args = args(["-R"]);
    if purge {
        // -n drops .pacsave backups, -s takes unneeded dependencies along
        remove_args.extend(args(["-n", "-s"]));
    }
    remove_args.push(name.into());

    native
        .run_checked(pacman, &remove_args)
        .map_err(|e| native.subprocess_error("removal failed", e))?;

    if purge {
        native.follow_up(pacman, &args(["-Scc", "--noconfirm"]), "clean package cache");
    }
    Ok(())
}

pub(crate) fn is_installed(native: &Native, name: &str) -> bool {
    native.query_succeeds(&native.ctx().config().tools.pacman, &args(["-Q", name]))
}

impl Package for ArchPackage {
    fn install(&mut self, force: bool) -> Result<()> {
        let _span =
            info_span!(parent: self.handle.ctx().span(), "install", format = "pacman").entered();
        self.handle.native().require_superuser("installation")?;

        info!("Installing Pacman package: {}", self.handle.path().display());
        self.handle.native().backup_state();

        let pacman = &self.handle.ctx().config().tools.pacman;
        let mut install_args = args(["-U"]);
        if force {
            install_args.extend(args(["--force", "--nodeps"]));
        }
        install_args.push(self.handle.path_arg());

        self.handle
            .native()
            .run_checked(pacman, &install_args)
            .map_err(|e| self.handle.native().subprocess_error("installation failed", e))?;

        self.handle
            .native()
            .follow_up(pacman, &args(["-Sy"]), "refresh package databases");

        info!("Package installed successfully");
        Ok(())
    }

    fn remove(&mut self, purge: bool) -> Result<()> {
        let _span =
            info_span!(parent: self.handle.ctx().span(), "remove", format = "pacman").entered();
        self.handle.native().require_superuser("removal")?;

        let name = self.handle.resolve_name(Self::load_metadata)?;
        info!("Removing Pacman package: {}", name);
        self.handle.native().backup_state();

        remove_named(self.handle.native(), &name, purge)?;

        info!("Package removed successfully");
        Ok(())
    }

    fn info(&mut self) -> Result<&PackageMetadata> {
        let _span = info_span!(parent: self.handle.ctx().span(), "info", format = "pacman").entered();
        self.handle.info_with(Self::load_metadata)
    }

    fn format(&self) -> PackageFormat {
        PackageFormat::Arch
    }

    fn display_name(&self) -> String {
        match self.handle.metadata() {
            Some(meta) => format!(
                "{}-{}-{}.pkg.tar.*",
                meta.name, meta.version, meta.architecture
            ),
            None => self.handle.file_name(),
        }
    }

    fn path(&self) -> &Path {
        self.handle.path()
    }

    fn verify_signature(&self) -> Result<()> {
        let pacman_key = &self.handle.ctx().config().tools.pacman_key;
        self.handle
            .native()
            .run_checked(pacman_key, &[OsString::from("--verify"), self.handle.path_arg()])
            .map_err(|e| self.handle.native().signature_error(e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::tempdir;

    fn pkg_tar(pkginfo: &str) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (name, data) in [(".PKGINFO", pkginfo.as_bytes()), ("usr/bin/hello", &b"\x7fELF"[..])] {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, data).unwrap();
        }
        builder.into_inner().unwrap()
    }

    const PKGINFO: &str = "pkgname = hello\npkgver = 2.12.1-1\narch = x86_64\ndepend = glibc\n";

    #[test]
    fn test_reads_zstd_package() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hello-2.12.1-1-x86_64.pkg.tar.zst");
        fs::write(&path, zstd::encode_all(&pkg_tar(PKGINFO)[..], 3).unwrap()).unwrap();

        let mut package = ArchPackage::open(&path, &Context::default()).unwrap();
        let meta = package.info().unwrap();
        assert_eq!(meta.name, "hello");
        assert_eq!(meta.dependencies, vec!["glibc"]);
        assert_eq!(package.display_name(), "hello-2.12.1-1-x86_64.pkg.tar.*");
    }

    #[test]
    fn test_reads_xz_package() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hello-2.12.1-1-x86_64.pkg.tar.xz");

        let mut encoder = xz2::write::XzEncoder::new(Vec::new(), 6);
        encoder.write_all(&pkg_tar(PKGINFO)).unwrap();
        fs::write(&path, encoder.finish().unwrap()).unwrap();

        let mut package = ArchPackage::open(&path, &Context::default()).unwrap();
        assert_eq!(package.info().unwrap().version, "2.12.1-1");
    }

    #[test]
    fn test_missing_pkginfo() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty-1-1-any.pkg.tar");

        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_gnu();
        header.set_size(2);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, "README", &b"hi"[..]).unwrap();
        fs::write(&path, builder.into_inner().unwrap()).unwrap();

        let mut package = ArchPackage::open(&path, &Context::default()).unwrap();
        let err = package.info().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::ParseFailure);
    }
}
