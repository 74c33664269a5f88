// src/parsers/alpine.rs

//! Alpine `.PKGINFO` parser
//!
//! Lines are `key=value`; abuild also writes them padded (`key = value`),
//! so both sides are trimmed after splitting on the first `=`.

use super::{PackageMetadata, is_ignorable, non_empty, parse_epoch, strip_constraint};
use crate::error::Result;
use crate::format::PackageFormat;
use tracing::debug;

/// Parse the contents of an Alpine `.PKGINFO`
///
/// A `depend` entry prefixed with `!` is an anti-dependency and is recorded
/// as a conflict.
pub fn parse_pkginfo(content: &str) -> Result<PackageMetadata> {
    let mut meta = PackageMetadata::default();

    for line in content.lines() {
        let line = line.trim();
        if is_ignorable(line) {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim();

        match key.trim() {
            "pkgname" => meta.name = value.to_string(),
            "pkgver" => meta.version = value.to_string(),
            "arch" => meta.architecture = value.to_string(),
            "maintainer" => meta.maintainer = non_empty(value),
            "pkgdesc" => meta.description = value.to_string(),
            "url" => meta.homepage = non_empty(value),
            "license" => meta.license = value.to_string(),
            "size" => meta.size = value.parse().unwrap_or(0),
            "builddate" => {
                if let Some(date) = parse_epoch(value) {
                    meta.install_date = date;
                }
            }
            "depend" => match value.strip_prefix('!') {
                Some(conflict) => push_name(&mut meta.conflicts, conflict),
                None => push_name(&mut meta.dependencies, value),
            },
            "provides" => push_name(&mut meta.provides, value),
            "replaces" => push_name(&mut meta.replaces, value),
            _ => {} // install_if, origin, commit, datahash, ...
        }
    }

    let meta = meta.require_identity(PackageFormat::Alpine)?;
    debug!(
        "Parsed .PKGINFO: {} {} ({} dependencies)",
        meta.name,
        meta.version,
        meta.dependencies.len()
    );
    Ok(meta)
}

fn push_name(list: &mut Vec<String>, value: &str) {
    // `~` is apk's fuzzy version match
    let name = strip_constraint(value.split('~').next().unwrap_or(value));
    if !name.is_empty() {
        list.push(name.to_string());
    }
}
