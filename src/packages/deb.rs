// src/packages/deb.rs

//! Debian package support
//!
//! Metadata comes from `dpkg-deb -f`; when dpkg-deb is not installed the
//! control file is read straight out of the AR archive's `control.tar.*`.
//! Installation goes through `dpkg -i` with one `apt-get install -f` repair
//! attempt if dpkg reports a failure.

use super::handle::{Native, PackageHandle};
use super::traits::Package;
use crate::command::{CommandError, args};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::filesystem::{Compression, FsError, read_member};
use crate::format::PackageFormat;
use crate::parsers::PackageMetadata;
use crate::parsers::debian::{installed_size_from_info, parse_control};
use std::ffi::OsString;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, info_span, warn};

/// A `.deb` file on disk
pub struct DebPackage {
    handle: PackageHandle,
}

/// AR archives start with `!<arch>`
fn is_deb(header: &[u8]) -> bool {
    header.starts_with(b"!<")
}

impl DebPackage {
    /// Open and validate a `.deb` file
    pub fn open(path: impl AsRef<Path>, ctx: &Context) -> Result<Self> {
        let handle = PackageHandle::open(path.as_ref(), PackageFormat::Debian, ctx, is_deb)?;
        Ok(Self { handle })
    }

    fn load_metadata(handle: &PackageHandle) -> Result<PackageMetadata> {
        let tools = &handle.ctx().config().tools;
        let native = handle.native();

        let fields_args = [OsString::from("-f"), handle.path_arg()];
        let control = match native.run_checked(&tools.dpkg_deb, &fields_args) {
            Ok(stdout) => stdout,
            Err(e) if e.is_missing_program() => {
                debug!("{} not available, reading control member directly", tools.dpkg_deb);
                let content = Self::read_control(handle.path())?;
                return parse_control(&content);
            }
            Err(e) => return Err(native.subprocess_error("failed to read control fields", e)),
        };

        let mut meta = parse_control(&control)?;

        if meta.size == 0 {
            let info_args = [OsString::from("-I"), handle.path_arg()];
            match native.run_checked(&tools.dpkg_deb, &info_args) {
                Ok(report) => {
                    if let Some(size) = installed_size_from_info(&report) {
                        meta.size = size;
                    }
                }
                Err(e) => debug!("Could not read installed size: {}", e),
            }
        }

        Ok(meta)
    }

    /// Find an AR member whose name starts with `prefix`
    fn read_ar_member(path: &Path, prefix: &str) -> Result<Option<Vec<u8>>> {
        let file = File::open(path).map_err(|e| {
            Error::not_found(PackageFormat::Debian, format!("failed to open {}", path.display()))
                .with_source(e)
        })?;

        let mut archive = ar::Archive::new(file);

        while let Some(entry) = archive.next_entry() {
            let mut entry = entry.map_err(|e| {
                Error::parse(PackageFormat::Debian, "failed to read AR entry").with_source(e)
            })?;

            let entry_name = String::from_utf8_lossy(entry.header().identifier()).to_string();

            if entry_name.starts_with(prefix) {
                let mut content = Vec::new();
                entry.read_to_end(&mut content).map_err(|e| {
                    Error::parse(PackageFormat::Debian, format!("failed to read {}", entry_name))
                        .with_source(e)
                })?;
                return Ok(Some(content));
            }
        }

        Ok(None)
    }

    /// Read the `control` file from `control.tar.{gz,xz,zst}` or a plain tar
    fn read_control(path: &Path) -> Result<String> {
        let Some(tar_data) = Self::read_ar_member(path, "control.tar")? else {
            return Err(Error::parse(
                PackageFormat::Debian,
                "control.tar not found in DEB archive",
            ));
        };

        let fs_err = |e: FsError| {
            Error::parse(PackageFormat::Debian, "failed to read control.tar").with_source(e)
        };

        let reader = Compression::sniff(&tar_data).decoder(&tar_data[..]).map_err(fs_err)?;
        let control = read_member(reader, "control")
            .map_err(fs_err)?
            .ok_or_else(|| Error::parse(PackageFormat::Debian, "control file not found in control.tar"))?;

        Ok(String::from_utf8_lossy(&control).into_owned())
    }
}

/// Remove an installed package by name, then tidy up with apt-get
pub(crate) fn remove_named(native: &Native, name: &str, purge: bool) -> Result<()> {
    let tools = &native.ctx().config().tools;
    let action = if purge { "--purge" } else { "--remove" };

    native
        .run_checked(&tools.dpkg, &args([action, name]))
        .map_err(|e| native.subprocess_error("removal failed", e))?;

    native.follow_up(
        &tools.apt_get,
        &args(["autoremove", "-y"]),
        "remove unused dependencies",
    );
    if purge {
        native.follow_up(&tools.apt_get, &args(["clean"]), "clean package cache");
    }
    Ok(())
}

/// Whether dpkg reports `name` as fully installed
pub(crate) fn is_installed(native: &Native, name: &str) -> bool {
    let dpkg = &native.ctx().config().tools.dpkg;
    match native.run_checked(dpkg, &args(["-s", name])) {
        Ok(status) => status.contains("Status: install ok installed"),
        Err(e) => {
            debug!("{}", e);
            false
        }
    }
}

impl Package for DebPackage {
    fn install(&mut self, force: bool) -> Result<()> {
        let _span = info_span!(parent: self.handle.ctx().span(), "install", format = "deb").entered();
        self.handle.native().require_superuser("installation")?;

        info!("Installing Debian package: {}", self.handle.path().display());
        self.handle.native().backup_state();

        let tools = &self.handle.ctx().config().tools;
        let mut install_args = args(["-i"]);
        if force {
            install_args.push("--force-all".into());
        }
        install_args.push(self.handle.path_arg());

        let output = self
            .handle
            .native()
            .run(&tools.dpkg, &install_args)
            .map_err(|e| self.handle.native().subprocess_error("installation failed", e))?;

        if output.is_success() {
            self.handle
                .native()
                .follow_up(&tools.apt_get, &args(["update"]), "update package cache");
            info!("Package installed successfully");
            return Ok(());
        }

        warn!("dpkg reported errors, attempting to fix dependencies");
        let failure = CommandError::exit(&tools.dpkg, &output);

        match self.handle.native().run(&tools.apt_get, &args(["install", "-f", "-y"])) {
            Ok(fix) if fix.is_success() => {
                warn!("Installation completed with warnings: {}", output.combined());
                Ok(())
            }
            Ok(fix) => Err(Error::subprocess(
                PackageFormat::Debian,
                format!(
                    "installation failed: {}\nfix attempt failed: {}",
                    output.combined(),
                    fix.combined()
                ),
            )
            .with_source(failure)),
            Err(e) => Err(Error::subprocess(
                PackageFormat::Debian,
                format!("installation failed: {}\nfix attempt failed: {}", output.combined(), e),
            )
            .with_source(failure)),
        }
    }

    fn remove(&mut self, purge: bool) -> Result<()> {
        let _span = info_span!(parent: self.handle.ctx().span(), "remove", format = "deb").entered();
        self.handle.native().require_superuser("removal")?;

        let name = self.handle.resolve_name(Self::load_metadata)?;
        info!("Removing Debian package: {}", name);
        self.handle.native().backup_state();

        remove_named(self.handle.native(), &name, purge)?;

        info!("Package removed successfully");
        Ok(())
    }

    fn info(&mut self) -> Result<&PackageMetadata> {
        let _span = info_span!(parent: self.handle.ctx().span(), "info", format = "deb").entered();
        self.handle.info_with(Self::load_metadata)
    }

    fn format(&self) -> PackageFormat {
        PackageFormat::Debian
    }

    fn display_name(&self) -> String {
        match self.handle.metadata() {
            Some(meta) => format!("{}_{}_{}.deb", meta.name, meta.version, meta.architecture),
            None => self.handle.file_name(),
        }
    }

    fn path(&self) -> &Path {
        self.handle.path()
    }

    fn verify_signature(&self) -> Result<()> {
        let tools = &self.handle.ctx().config().tools;
        self.handle
            .native()
            .run_checked(&tools.dpkg_sig, &[OsString::from("--verify"), self.handle.path_arg()])
            .map_err(|e| self.handle.native().signature_error(e))?;
        Ok(())
    }
}
