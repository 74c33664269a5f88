// src/packages/handle.rs

//! State and plumbing shared by every package entity
//!
//! A [`PackageHandle`] owns the validated path and the metadata cache. Its
//! [`Native`] carries the injected [`Context`] and the helpers for privilege
//! checks, backups and tool invocation that every format builds on.

use crate::command::{CommandError, CommandOutput};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::filesystem::{FsError, create_backup, prune_backups};
use crate::format::{PackageFormat, detect};
use crate::parsers::PackageMetadata;
use crate::version::validate_package_name;
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Magic-byte predicate applied to the first bytes of a package file
pub(crate) type MagicCheck = fn(&[u8]) -> bool;

const HEADER_LEN: usize = 8;

/// Native-tool plumbing for one format, independent of any package file
///
/// Used by package entities and by removal of installed packages by name.
#[derive(Debug, Clone)]
pub(crate) struct Native {
    ctx: Context,
    format: PackageFormat,
}

impl Native {
    pub(crate) fn new(ctx: &Context, format: PackageFormat) -> Self {
        Self {
            ctx: ctx.clone(),
            format,
        }
    }

    pub(crate) fn ctx(&self) -> &Context {
        &self.ctx
    }

    pub(crate) fn format(&self) -> PackageFormat {
        self.format
    }

    pub(crate) fn require_superuser(&self, operation: &str) -> Result<()> {
        self.ctx.privilege().require_superuser(self.format, operation)
    }

    /// Snapshot the format's package database before a mutation
    ///
    /// Never fails the caller; problems are logged.
    pub(crate) fn backup_state(&self) {
        let config = self.ctx.config();
        if !config.create_backups {
            debug!("Backups disabled, skipping");
            return;
        }

        let Some(state) = config.state.for_format(self.format) else {
            return;
        };

        match create_backup(&config.backup_root, state) {
            Ok(archive) => info!("Backed up {} to {}", state.display(), archive.display()),
            Err(e) => {
                warn!("Failed to create backup of {}: {}", state.display(), e);
                return;
            }
        }

        if config.backup_retention > 0 {
            match prune_backups(&config.backup_root, state, config.backup_retention) {
                Ok(0) => {}
                Ok(removed) => debug!("Pruned {} old backups of {}", removed, state.display()),
                Err(e) => warn!("Failed to prune backups of {}: {}", state.display(), e),
            }
        }
    }

    /// Run a tool, returning its output whatever the exit status
    pub(crate) fn run(
        &self,
        program: &str,
        args: &[OsString],
    ) -> std::result::Result<CommandOutput, CommandError> {
        self.ctx
            .runner()
            .run(program, args)
            .map_err(|source| CommandError::Spawn {
                program: program.to_string(),
                source,
            })
    }

    /// Run a tool and require a zero exit, returning stdout
    pub(crate) fn run_checked(
        &self,
        program: &str,
        args: &[OsString],
    ) -> std::result::Result<String, CommandError> {
        let output = self.run(program, args)?;
        if output.is_success() {
            Ok(output.stdout)
        } else {
            Err(CommandError::exit(program, &output))
        }
    }

    /// Best-effort follow-up command; failures only warn
    pub(crate) fn follow_up(&self, program: &str, args: &[OsString], what: &str) {
        if let Err(e) = self.run_checked(program, args) {
            warn!("Failed to {}: {}", what, e);
        }
    }

    /// Whether a read-only query exits zero; a missing tool counts as no
    pub(crate) fn query_succeeds(&self, program: &str, args: &[OsString]) -> bool {
        match self.run(program, args) {
            Ok(output) => output.is_success(),
            Err(e) => {
                debug!("{}", e);
                false
            }
        }
    }

    /// Wrap a tool failure with this format's tag
    pub(crate) fn subprocess_error(&self, message: impl Into<String>, err: CommandError) -> Error {
        Error::subprocess(self.format, message).with_source(err)
    }

    /// Turn a signature-check failure into the matching error kind
    pub(crate) fn signature_error(&self, err: CommandError) -> Error {
        match err {
            CommandError::Exit { .. } => {
                Error::verification(self.format, "signature verification failed").with_source(err)
            }
            CommandError::Spawn { .. } => {
                self.subprocess_error("failed to run signature check", err)
            }
        }
    }

    /// Wrap a failure reading the package archive itself
    pub(crate) fn archive_error(&self, message: impl Into<String>, err: FsError) -> Error {
        if err.is_not_found() {
            Error::not_found(self.format, message).with_source(err)
        } else {
            Error::parse(self.format, message).with_source(err)
        }
    }
}

#[derive(Debug)]
pub(crate) struct PackageHandle {
    path: PathBuf,
    native: Native,
    metadata: Option<PackageMetadata>,
    name: Option<String>,
}

impl PackageHandle {
    /// Validate `path` for `format` and take ownership of the context
    ///
    /// The file must exist, be a non-empty regular file named like the
    /// format and start with the format's magic bytes.
    pub(crate) fn open(
        path: &Path,
        format: PackageFormat,
        ctx: &Context,
        magic: MagicCheck,
    ) -> Result<Self> {
        let path = std::path::absolute(path).map_err(|e| {
            Error::validation(format, format!("invalid package path {}", path.display()))
                .with_source(e)
        })?;

        if detect(&path) != format {
            return Err(Error::validation(
                format,
                format!("{} is not a .{} package", path.display(), format),
            ));
        }

        let metadata = std::fs::metadata(&path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                Error::not_found(format, format!("package file {} does not exist", path.display()))
                    .with_source(e)
            } else {
                Error::validation(format, format!("cannot stat {}", path.display())).with_source(e)
            }
        })?;

        if !metadata.is_file() {
            return Err(Error::validation(
                format,
                format!("{} is not a regular file", path.display()),
            ));
        }

        if metadata.len() == 0 {
            return Err(Error::validation(
                format,
                format!("package file {} is empty", path.display()),
            ));
        }

        let header = read_header(&path).map_err(|e| {
            Error::validation(format, format!("cannot read {}", path.display())).with_source(e)
        })?;
        if !magic(&header) {
            return Err(Error::validation(
                format,
                format!("{} does not look like a {} package", path.display(), format),
            ));
        }

        debug!("Opened {} package: {}", format, path.display());

        Ok(Self {
            path,
            native: Native::new(ctx, format),
            metadata: None,
            name: None,
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn native(&self) -> &Native {
        &self.native
    }

    pub(crate) fn ctx(&self) -> &Context {
        self.native.ctx()
    }

    pub(crate) fn metadata(&self) -> Option<&PackageMetadata> {
        self.metadata.as_ref()
    }

    /// Base name of the package file
    pub(crate) fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Return cached metadata, loading it once on first use
    pub(crate) fn info_with<F>(&mut self, load: F) -> Result<&PackageMetadata>
    where
        F: FnOnce(&PackageHandle) -> Result<PackageMetadata>,
    {
        let metadata = match self.metadata.take() {
            Some(metadata) => metadata,
            None => {
                let metadata = load(&*self)?;
                if self.name.is_none() {
                    self.name = Some(metadata.name.clone());
                }
                metadata
            }
        };

        Ok(self.metadata.insert(metadata))
    }

    /// Name to pass to the native remover, fetched from metadata if unknown
    pub(crate) fn resolve_name<F>(&mut self, load: F) -> Result<String>
    where
        F: FnOnce(&PackageHandle) -> Result<PackageMetadata>,
    {
        let name = match self.name.clone() {
            Some(name) => name,
            None => self
                .info_with(load)
                .map_err(|e| e.context("failed to get package info"))?
                .name
                .clone(),
        };

        validate_package_name(&name, self.native.format())?;
        Ok(name)
    }

    /// Path as a command argument
    pub(crate) fn path_arg(&self) -> OsString {
        self.path.as_os_str().to_os_string()
    }
}

fn read_header(path: &Path) -> io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut header = Vec::with_capacity(HEADER_LEN);
    file.take(HEADER_LEN as u64).read_to_end(&mut header)?;
    Ok(header)
}
