// src/parsers/rpm.rs

//! RPM query output parser
//!
//! Handles the `Key : value` report printed by `rpm -qip` and the one
//! capability per line lists printed by `rpm -qpR`, `--provides` and
//! `--conflicts`.

use super::{PackageMetadata, is_ignorable, non_empty};
use crate::error::Result;
use crate::format::PackageFormat;
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::debug;

/// Date layouts `rpm` prints for `Build Date` under `LANG=C`
const BUILD_DATE_FORMATS: &[&str] = &["%a %b %d %H:%M:%S %Y", "%a %d %b %Y %I:%M:%S %p"];

/// Parse `rpm -qip` output
///
/// `Description` is always the last field; every line after it belongs to
/// the description body.
pub fn parse_query(content: &str) -> Result<PackageMetadata> {
    let mut meta = PackageMetadata::default();
    let mut version = String::new();
    let mut release = String::new();
    let mut packager = None;
    let mut vendor = None;
    let mut summary = String::new();
    let mut body: Option<Vec<&str>> = None;

    for line in content.lines() {
        if let Some(body) = body.as_mut() {
            body.push(line.trim_end());
            continue;
        }

        let line = line.trim();
        if is_ignorable(line) {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();

        match key.trim() {
            "Name" => meta.name = value.to_string(),
            "Version" => version = value.to_string(),
            "Release" => release = value.to_string(),
            "Architecture" => meta.architecture = value.to_string(),
            "Group" => meta.section = value.to_string(),
            "Size" => {
                // "Size        : 1234567" sometimes carries a unit suffix
                meta.size = value
                    .split_whitespace()
                    .next()
                    .and_then(|n| n.parse().ok())
                    .unwrap_or(0);
            }
            "License" => meta.license = value.to_string(),
            "URL" => meta.homepage = non_empty(value),
            "Packager" => packager = non_empty(value),
            "Vendor" => vendor = non_empty(value),
            "Build Date" => {
                if let Some(date) = parse_build_date(value) {
                    meta.install_date = date;
                }
            }
            "Summary" => summary = value.to_string(),
            "Description" => {
                let mut lines = Vec::new();
                if !value.is_empty() {
                    lines.push(value);
                }
                body = Some(lines);
            }
            _ => {} // Ignore unknown fields
        }
    }

    meta.version = match (version.is_empty(), release.is_empty()) {
        (false, false) => format!("{}-{}", version, release),
        _ => version,
    };
    meta.maintainer = packager.or(vendor);

    let description = body
        .map(|lines| lines.join("\n").trim().to_string())
        .unwrap_or_default();
    meta.description = match (summary.is_empty(), description.is_empty()) {
        (false, false) => format!("{}\n{}", summary, description),
        (false, true) => summary,
        _ => description,
    };

    let meta = meta.require_identity(PackageFormat::Rpm)?;
    debug!("Parsed rpm query: {} {}", meta.name, meta.version);
    Ok(meta)
}

/// Parse a capability list (`rpm -qpR`, `--provides`, `--conflicts`)
///
/// Keeps the capability name only. `rpmlib(...)` features and file-path
/// requirements are dropped, duplicates are removed in order.
pub fn parse_capabilities(content: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();

    for line in content.lines() {
        let Some(name) = line.split_whitespace().next() else {
            continue;
        };

        if name.starts_with("rpmlib(") || name.starts_with('/') {
            continue;
        }

        if !names.iter().any(|existing| existing == name) {
            names.push(name.to_string());
        }
    }

    names
}

/// Parse a `Build Date` value, ignoring a trailing zone abbreviation
fn parse_build_date(value: &str) -> Option<DateTime<Utc>> {
    let mut tokens: Vec<&str> = value.split_whitespace().collect();
    if tokens
        .last()
        .is_some_and(|t| t.chars().all(|c| c.is_ascii_alphabetic()) && !matches!(*t, "AM" | "PM"))
    {
        tokens.pop();
    }
    let normalized = tokens.join(" ");

    BUILD_DATE_FORMATS.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(&normalized, format)
            .ok()
            .map(|naive| naive.and_utc())
    })
}
