// src/lib.rs

//! Unipkg
//!
//! One interface for installing, removing and inspecting packages in the
//! deb, rpm, eopkg, pacman and apk formats.
//!
//! # Architecture
//!
//! - Detection: the format is chosen from the file name alone
//! - Entities: one [`packages::Package`] implementation per format, each
//!   delegating mutations to the native tool
//! - Parsers: pure functions turning each format's metadata dialect into
//!   one [`packages::PackageMetadata`] record
//! - Filesystem: archive reads, backups, hashing and atomic copies with no
//!   knowledge of package formats
//! - Context: configuration, command runner, privilege gate and logging
//!   span passed explicitly to every entity

pub mod command;
pub mod config;
pub mod context;
mod error;
pub mod filesystem;
pub mod format;
pub mod packages;
pub mod parsers;
pub mod privilege;
pub mod version;

pub use error::{Error, ErrorKind, Result};
