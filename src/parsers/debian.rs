// src/parsers/debian.rs

//! Debian control field parser
//!
//! Parses the `Key: value` block printed by `dpkg-deb -f` (or read from the
//! `control` member of `control.tar.*`). Lines starting with whitespace
//! continue the previous field; for `Description` they become new lines,
//! with a lone `.` standing for an empty line.

use super::{PackageMetadata, is_ignorable, non_empty};
use crate::error::Result;
use crate::format::PackageFormat;
use tracing::debug;

/// Parse a Debian control block
pub fn parse_control(content: &str) -> Result<PackageMetadata> {
    let mut meta = PackageMetadata::default();
    let mut pre_depends = Vec::new();
    let mut depends = Vec::new();

    for (field, value) in fold_fields(content) {
        match field.as_str() {
            "Package" => meta.name = value,
            "Version" => meta.version = value,
            "Architecture" => meta.architecture = value,
            "Description" => meta.description = value,
            "Maintainer" => meta.maintainer = non_empty(&value),
            "Homepage" => meta.homepage = non_empty(&value),
            "Section" => meta.section = value,
            "Priority" => meta.priority = value,
            "Installed-Size" => {
                // Reported in KiB
                meta.size = value.parse::<u64>().unwrap_or(0).saturating_mul(1024);
            }
            "Pre-Depends" => pre_depends = parse_dependency_list(&value),
            "Depends" => depends = parse_dependency_list(&value),
            "Conflicts" => meta.conflicts = parse_dependency_list(&value),
            "Provides" => meta.provides = parse_dependency_list(&value),
            "Replaces" => meta.replaces = parse_dependency_list(&value),
            _ => {} // Ignore unknown fields
        }
    }

    pre_depends.extend(depends);
    meta.dependencies = pre_depends;

    let meta = meta.require_identity(PackageFormat::Debian)?;
    debug!(
        "Parsed control: {} {} ({} dependencies)",
        meta.name,
        meta.version,
        meta.dependencies.len()
    );
    Ok(meta)
}

/// Group raw lines into `(field, value)` pairs, folding continuations
fn fold_fields(content: &str) -> Vec<(String, String)> {
    let mut fields: Vec<(String, String)> = Vec::new();

    for line in content.lines() {
        if line.starts_with(' ') || line.starts_with('\t') {
            let Some((field, value)) = fields.last_mut() else {
                continue;
            };

            let continuation = line.trim();
            if field.as_str() == "Description" {
                value.push('\n');
                if continuation != "." {
                    value.push_str(continuation);
                }
            } else if !continuation.is_empty() {
                if !value.is_empty() {
                    value.push(' ');
                }
                value.push_str(continuation);
            }
            continue;
        }

        if is_ignorable(line.trim()) {
            continue;
        }

        if let Some((field, value)) = line.split_once(':') {
            fields.push((field.trim().to_string(), value.trim().to_string()));
        }
    }

    fields
}

/// Parse a comma-separated relationship field into bare package names
///
/// `libc6 (>= 2.34), zlib1g | libz` yields `["libc6", "zlib1g"]`.
pub fn parse_dependency_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|dep| !dep.is_empty())
        .map(|dep| {
            let end = dep
                .find(|c: char| c.is_whitespace() || c == '(')
                .unwrap_or(dep.len());
            dep[..end].to_string()
        })
        .filter(|dep| !dep.is_empty())
        .collect()
}

/// Pull the installed size out of a `dpkg-deb -I` report, in bytes
pub fn installed_size_from_info(report: &str) -> Option<u64> {
    report.lines().find_map(|line| {
        let lower = line.trim().to_ascii_lowercase();
        let rest = lower
            .strip_prefix("installed-size:")
            .or_else(|| lower.strip_prefix("installed size:"))?;
        let kib: u64 = rest.split_whitespace().next()?.parse().ok()?;
        Some(kib.saturating_mul(1024))
    })
}
