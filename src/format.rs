// src/format.rs

//! Package format tags and detection from a file path

use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Native package format of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageFormat {
    #[default]
    Unknown,
    /// Debian/Ubuntu `.deb`
    Debian,
    /// Red Hat/Fedora `.rpm`
    Rpm,
    /// Solus `.eopkg`
    Solus,
    /// Arch Linux `.pkg.tar.*`
    Arch,
    /// Alpine `.apk`
    Alpine,
}

impl PackageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageFormat::Unknown => "unknown",
            PackageFormat::Debian => "deb",
            PackageFormat::Rpm => "rpm",
            PackageFormat::Solus => "eopkg",
            PackageFormat::Arch => "pacman",
            PackageFormat::Alpine => "apk",
        }
    }

    pub fn is_known(&self) -> bool {
        *self != PackageFormat::Unknown
    }
}

impl fmt::Display for PackageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the package format from path syntax alone
///
/// The path does not need to exist. Anything unrecognised maps to
/// [`PackageFormat::Unknown`]; callers must check for it.
pub fn detect(path: impl AsRef<Path>) -> PackageFormat {
    let path = path.as_ref();

    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase());

    match extension.as_deref() {
        Some("deb") => return PackageFormat::Debian,
        Some("rpm") => return PackageFormat::Rpm,
        Some("eopkg") => return PackageFormat::Solus,
        Some("apk") => return PackageFormat::Alpine,
        _ => {}
    }

    // Covers .pkg.tar.gz, .pkg.tar.xz, .pkg.tar.zst and friends. makepkg
    // only ever writes the lowercase infix.
    let is_arch = path
        .file_name()
        .map(|name| name.to_string_lossy().contains("pkg.tar"))
        .unwrap_or(false);

    if is_arch {
        PackageFormat::Arch
    } else {
        PackageFormat::Unknown
    }
}
