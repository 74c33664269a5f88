// src/packages/mod.rs

//! Package format support
//!
//! Each native format has one entity type implementing [`Package`]. Callers
//! normally go through [`open`], which picks the entity from the file name,
//! or through [`install`] and [`remove`], which check privileges before the
//! file is even looked at. [`remove_installed`] removes by package name.

pub mod apk;
pub mod arch;
pub mod deb;
pub mod eopkg;
mod handle;
pub mod rpm;
pub mod traits;

pub use crate::parsers::PackageMetadata;
pub use apk::ApkPackage;
pub use arch::ArchPackage;
pub use deb::DebPackage;
pub use eopkg::EopkgPackage;
pub use rpm::RpmPackage;
pub use traits::Package;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::format::{PackageFormat, detect};
use crate::version::validate_package_name;
use handle::Native;
use std::path::Path;
use tracing::{debug, info, info_span};

/// Open the package at `path` as the entity matching its format
///
/// Detection is by file name only; the entity constructor then checks
/// existence, size and magic bytes.
pub fn open(path: impl AsRef<Path>, ctx: &Context) -> Result<Box<dyn Package>> {
    let path = path.as_ref();
    let format = detect(path);
    debug!("Detected format {} for {}", format, path.display());

    let package: Box<dyn Package> = match format {
        PackageFormat::Debian => Box::new(DebPackage::open(path, ctx)?),
        PackageFormat::Rpm => Box::new(RpmPackage::open(path, ctx)?),
        PackageFormat::Solus => Box::new(EopkgPackage::open(path, ctx)?),
        PackageFormat::Arch => Box::new(ArchPackage::open(path, ctx)?),
        PackageFormat::Alpine => Box::new(ApkPackage::open(path, ctx)?),
        PackageFormat::Unknown => {
            return Err(Error::unsupported(format!(
                "unsupported package format: {}",
                path.display()
            )));
        }
    };

    Ok(package)
}

/// Install the package at `path`
///
/// Privileges are checked first, so a non-root caller gets PermissionDenied
/// whether or not the path exists.
pub fn install(path: impl AsRef<Path>, force: bool, ctx: &Context) -> Result<Box<dyn Package>> {
    let path = path.as_ref();
    ctx.privilege()
        .require_superuser(detect(path), "installation")?;

    let mut package = open(path, ctx)?;
    package.install(force)?;
    Ok(package)
}

/// Remove the package described by the file at `path`
pub fn remove(path: impl AsRef<Path>, purge: bool, ctx: &Context) -> Result<Box<dyn Package>> {
    let path = path.as_ref();
    ctx.privilege().require_superuser(detect(path), "removal")?;

    let mut package = open(path, ctx)?;
    package.remove(purge)?;
    Ok(package)
}

type InstalledCheck = fn(&Native, &str) -> bool;
type NamedRemover = fn(&Native, &str, bool) -> Result<()>;

/// Native tools in the order they are asked about installed packages
const NATIVE_TOOLS: [(PackageFormat, InstalledCheck, NamedRemover); 5] = [
    (PackageFormat::Debian, deb::is_installed, deb::remove_named),
    (PackageFormat::Rpm, rpm::is_installed, rpm::remove_named),
    (PackageFormat::Solus, eopkg::is_installed, eopkg::remove_named),
    (PackageFormat::Arch, arch::is_installed, arch::remove_named),
    (PackageFormat::Alpine, apk::is_installed, apk::remove_named),
];

fn find_installed(name: &str, ctx: &Context) -> Option<(Native, NamedRemover)> {
    NATIVE_TOOLS.into_iter().find_map(|(format, check, remover)| {
        let native = Native::new(ctx, format);
        if check(&native, name) {
            debug!("{} is installed via {}", name, format);
            Some((native, remover))
        } else {
            None
        }
    })
}

/// First format whose native tool reports `name` as installed
///
/// dpkg is asked first, then rpm, eopkg, pacman and apk. A tool that is not
/// present simply answers no.
pub fn installed_format(name: &str, ctx: &Context) -> Option<PackageFormat> {
    find_installed(name, ctx).map(|(native, _)| native.format())
}

/// Remove an installed package by name, using whichever native tool owns it
///
/// Returns the format that performed the removal.
pub fn remove_installed(name: &str, purge: bool, ctx: &Context) -> Result<PackageFormat> {
    ctx.privilege()
        .require_superuser(PackageFormat::Unknown, "removal")?;
    validate_package_name(name, PackageFormat::Unknown)?;

    let Some((native, remover)) = find_installed(name, ctx) else {
        return Err(Error::not_found(
            PackageFormat::Unknown,
            format!("package {} is not installed", name),
        ));
    };

    let format = native.format();
    let _span = info_span!(parent: ctx.span(), "remove", format = format.as_str()).entered();
    info!("Removing installed package: {}", name);
    native.backup_state();

    remover(&native, name, purge)?;

    info!("Package removed successfully");
    Ok(format)
}
