// src/version.rs

//! Normalization helpers shared by every package format
//!
//! Human-readable sizes, version ordering across the different versioning
//! schemes the five formats use, and package-name validation before a name
//! is handed to a native remover.

use crate::error::{Error, Result};
use crate::format::PackageFormat;
use std::cmp::Ordering;

const SIZE_UNITS: [&str; 6] = ["KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

/// Format a byte count with binary units
///
/// Values below 1024 are printed exactly (`"1023 B"`); larger values use one
/// decimal place (`"1.0 KiB"`, `"1.5 MiB"`).
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{:.1} {}", value, SIZE_UNITS[unit])
}

/// Compare two version strings
///
/// Strict semantic versions compare by semver rules. Anything else (Debian
/// revisions, RPM releases, Arch pkgrel suffixes) is split into an optional
/// `epoch:` prefix and then compared run by run: digit runs numerically,
/// letter runs lexically, with a numeric run ordering after a letter run.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    if let (Ok(va), Ok(vb)) = (semver::Version::parse(a), semver::Version::parse(b)) {
        return va.cmp(&vb);
    }

    let (epoch_a, rest_a) = split_epoch(a);
    let (epoch_b, rest_b) = split_epoch(b);

    epoch_a
        .cmp(&epoch_b)
        .then_with(|| compare_segments(rest_a, rest_b))
}

fn split_epoch(version: &str) -> (u64, &str) {
    match version.split_once(':') {
        Some((epoch, rest)) if !epoch.is_empty() && epoch.bytes().all(|b| b.is_ascii_digit()) => {
            (epoch.parse().unwrap_or(0), rest)
        }
        _ => (0, version),
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Alpha(&'a str),
    Numeric(&'a str),
}

fn segments(version: &str) -> Vec<Segment<'_>> {
    let bytes = version.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if !bytes[i].is_ascii_alphanumeric() {
            i += 1;
            continue;
        }

        let start = i;
        let numeric = bytes[i].is_ascii_digit();
        while i < bytes.len()
            && bytes[i].is_ascii_alphanumeric()
            && bytes[i].is_ascii_digit() == numeric
        {
            i += 1;
        }

        let run = &version[start..i];
        out.push(if numeric {
            Segment::Numeric(run)
        } else {
            Segment::Alpha(run)
        });
    }

    out
}

fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn compare_segments(a: &str, b: &str) -> Ordering {
    let left = segments(a);
    let right = segments(b);

    for (l, r) in left.iter().zip(right.iter()) {
        let ord = match (l, r) {
            (Segment::Numeric(x), Segment::Numeric(y)) => compare_numeric(x, y),
            (Segment::Alpha(x), Segment::Alpha(y)) => x.cmp(y),
            (Segment::Numeric(_), Segment::Alpha(_)) => Ordering::Greater,
            (Segment::Alpha(_), Segment::Numeric(_)) => Ordering::Less,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    left.len().cmp(&right.len())
}

const FORBIDDEN_NAME_CHARS: &[char] = &[
    '/', '#', '%', '*', '[', ']', '(', ')', '{', '}', '<', '>', '\\', '|', '"', '\'', '`', '~',
    ';', '&', '$', '!', '?',
];

/// Check that a package name is safe to pass to a native remover
///
/// Rejects empty names, names starting with `-` (they would parse as
/// options), whitespace and shell or glob metacharacters.
pub fn validate_package_name(name: &str, format: PackageFormat) -> Result<()> {
    if name.is_empty() {
        return Err(Error::validation(format, "package name is empty"));
    }

    if name.starts_with('-') {
        return Err(Error::validation(
            format,
            format!("package name '{}' must not start with '-'", name),
        ));
    }

    if let Some(bad) = name
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || FORBIDDEN_NAME_CHARS.contains(c))
    {
        return Err(Error::validation(
            format,
            format!("package name '{}' contains invalid character {:?}", name, bad),
        ));
    }

    Ok(())
}
