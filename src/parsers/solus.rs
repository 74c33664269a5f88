// src/parsers/solus.rs

//! Solus `metadata.xml` parser
//!
//! The document has a `Source` section (homepage, packager), a `Package`
//! section (name, summary, dependencies, file list) and a `History` of
//! updates, newest first. The version lives only in the history.

use super::{PackageMetadata, non_empty};
use crate::error::{Error, Result};
use crate::format::PackageFormat;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(rename = "PISI")]
struct Pisi {
    #[serde(rename = "Source", default)]
    source: Source,
    #[serde(rename = "Package")]
    package: Package,
    #[serde(rename = "History", default)]
    history: History,
}

#[derive(Debug, Default, Deserialize)]
struct Source {
    #[serde(rename = "Homepage", default)]
    homepage: String,
    #[serde(rename = "Packager", default)]
    packager: Packager,
    #[serde(rename = "License", default)]
    license: Vec<Text>,
}

#[derive(Debug, Default, Deserialize)]
struct Packager {
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Email", default)]
    email: String,
}

#[derive(Debug, Deserialize)]
struct Package {
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Summary", default)]
    summary: Vec<Text>,
    #[serde(rename = "Description", default)]
    description: Vec<Text>,
    #[serde(rename = "PartOf", default)]
    part_of: String,
    #[serde(rename = "License", default)]
    license: Vec<Text>,
    #[serde(rename = "Architecture", default)]
    architecture: String,
    #[serde(rename = "InstalledSize", default)]
    installed_size: String,
    #[serde(rename = "RuntimeDependencies", default)]
    runtime_dependencies: Dependencies,
    #[serde(rename = "Conflicts", default)]
    conflicts: PackageList,
    #[serde(rename = "Replaces", default)]
    replaces: PackageList,
    #[serde(rename = "Provides", default)]
    provides: Provides,
    #[serde(rename = "Files", default)]
    files: Files,
}

/// Element text, attributes such as `xml:lang` or `releaseFrom` ignored
#[derive(Debug, Default, Deserialize)]
struct Text {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Default, Deserialize)]
struct Dependencies {
    #[serde(rename = "Dependency", default)]
    dependency: Vec<Text>,
}

#[derive(Debug, Default, Deserialize)]
struct PackageList {
    #[serde(rename = "Package", default)]
    package: Vec<Text>,
}

#[derive(Debug, Default, Deserialize)]
struct Provides {
    #[serde(rename = "PkgConfig", default)]
    pkgconfig: Vec<Text>,
    #[serde(rename = "PkgConfig32", default)]
    pkgconfig32: Vec<Text>,
}

#[derive(Debug, Default, Deserialize)]
struct Files {
    #[serde(rename = "File", default)]
    file: Vec<File>,
}

#[derive(Debug, Default, Deserialize)]
struct File {
    #[serde(rename = "Size", default)]
    size: String,
}

#[derive(Debug, Default, Deserialize)]
struct History {
    #[serde(rename = "Update", default)]
    update: Vec<Update>,
}

#[derive(Debug, Default, Deserialize)]
struct Update {
    #[serde(rename = "@release", default)]
    release: String,
    #[serde(rename = "Date", default)]
    date: String,
    #[serde(rename = "Version", default)]
    version: String,
}

fn texts(items: &[Text]) -> impl Iterator<Item = String> + '_ {
    items
        .iter()
        .map(|t| t.value.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Parse a `metadata.xml` document
pub fn parse_metadata_xml(content: &str) -> Result<PackageMetadata> {
    let doc: Pisi = quick_xml::de::from_str(content).map_err(|e| {
        Error::parse(PackageFormat::Solus, "failed to parse metadata.xml").with_source(e)
    })?;

    let Some(latest) = doc.history.update.first() else {
        return Err(Error::parse(
            PackageFormat::Solus,
            format!("no update history for package {}", doc.package.name),
        ));
    };

    let package = &doc.package;
    let mut meta = PackageMetadata {
        name: package.name.trim().to_string(),
        version: latest.version.trim().to_string(),
        architecture: package.architecture.trim().to_string(),
        homepage: non_empty(&doc.source.homepage),
        section: package.part_of.trim().to_string(),
        dependencies: texts(&package.runtime_dependencies.dependency).collect(),
        conflicts: texts(&package.conflicts.package).collect(),
        replaces: texts(&package.replaces.package).collect(),
        ..PackageMetadata::default()
    };

    meta.provides = texts(&package.provides.pkgconfig)
        .map(|name| format!("pkgconfig({})", name))
        .chain(texts(&package.provides.pkgconfig32).map(|name| format!("pkgconfig32({})", name)))
        .collect();

    let summary = texts(&package.summary).next().unwrap_or_default();
    meta.description = texts(&package.description).next().unwrap_or(summary);

    let licenses: Vec<String> = if package.license.is_empty() {
        texts(&doc.source.license).collect()
    } else {
        texts(&package.license).collect()
    };
    meta.license = licenses.join(", ");

    let packager = &doc.source.packager;
    meta.maintainer = match (packager.name.trim(), packager.email.trim()) {
        ("", _) => None,
        (name, "") => Some(name.to_string()),
        (name, email) => Some(format!("{} <{}>", name, email)),
    };

    let file_total: u64 = package
        .files
        .file
        .iter()
        .filter_map(|f| f.size.trim().parse::<u64>().ok())
        .sum();
    meta.size = if file_total > 0 {
        file_total
    } else {
        package.installed_size.trim().parse().unwrap_or(0)
    };

    if let Ok(date) = NaiveDate::parse_from_str(latest.date.trim(), "%Y-%m-%d")
        && let Some(midnight) = date.and_hms_opt(0, 0, 0)
    {
        meta.install_date = midnight.and_utc();
    }

    let meta = meta.require_identity(PackageFormat::Solus)?;
    debug!(
        "Parsed metadata.xml: {} {} (release {})",
        meta.name, meta.version, latest.release
    );
    Ok(meta)
}
