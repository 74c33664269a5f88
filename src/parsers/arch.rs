// src/parsers/arch.rs

//! Arch Linux `.PKGINFO` parser
//!
//! Each line is `key = value`. Multi-valued keys (`license`, `depend`,
//! `optdepend`, `provides`, `conflict`, `replaces`, `group`) repeat once per
//! value.

use super::{PackageMetadata, is_ignorable, non_empty, parse_epoch, strip_constraint};
use crate::error::Result;
use crate::format::PackageFormat;
use tracing::debug;

/// Parse the contents of an Arch `.PKGINFO`
pub fn parse_pkginfo(content: &str) -> Result<PackageMetadata> {
    let mut meta = PackageMetadata::default();
    let mut licenses = Vec::new();
    let mut groups = Vec::new();
    let mut optdepends = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if is_ignorable(line) {
            continue;
        }

        let Some((key, value)) = line.split_once(" = ") else {
            continue;
        };
        let value = value.trim();

        match key.trim() {
            "pkgname" => meta.name = value.to_string(),
            "pkgver" => meta.version = value.to_string(),
            "pkgdesc" => meta.description = value.to_string(),
            "url" => meta.homepage = non_empty(value),
            "arch" => meta.architecture = value.to_string(),
            "packager" => meta.maintainer = non_empty(value),
            "size" => meta.size = value.parse().unwrap_or(0),
            "builddate" => {
                if let Some(date) = parse_epoch(value) {
                    meta.install_date = date;
                }
            }
            "license" => licenses.push(value.to_string()),
            "group" => groups.push(value.to_string()),
            "depend" => push_name(&mut meta.dependencies, value),
            "optdepend" => optdepends.push(value.to_string()),
            "provides" => push_name(&mut meta.provides, value),
            "conflict" => push_name(&mut meta.conflicts, value),
            "replaces" => push_name(&mut meta.replaces, value),
            _ => {} // makedepend, checkdepend, backup, xdata, ...
        }
    }

    meta.license = licenses.join(", ");
    meta.section = groups.join(", ");

    if !optdepends.is_empty() {
        meta.description.push_str("\n\nOptional Dependencies:\n");
        meta.description.push_str(&optdepends.join("\n"));
    }

    let meta = meta.require_identity(PackageFormat::Arch)?;
    debug!(
        "Parsed .PKGINFO: {} {} ({} dependencies)",
        meta.name,
        meta.version,
        meta.dependencies.len()
    );
    Ok(meta)
}

fn push_name(list: &mut Vec<String>, value: &str) {
    let name = strip_constraint(value);
    if !name.is_empty() {
        list.push(name.to_string());
    }
}
