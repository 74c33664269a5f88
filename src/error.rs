// src/error.rs

use crate::format::PackageFormat;
use std::fmt;
use thiserror::Error;

/// Boxed lower-layer cause carried by an [`Error`]
pub type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure classes shared by every package format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad path, wrong extension or magic, empty file, invalid name
    Validation,
    /// The operation needs superuser privileges
    PermissionDenied,
    /// Missing file or installed-package lookup miss
    NotFound,
    /// No format matched the path
    Unsupported,
    /// Metadata could not be made sense of
    ParseFailure,
    /// A native tool could not be run or exited non-zero
    SubprocessFailure,
    /// The system did not reach the expected state after an operation
    VerificationFailure,
}

impl ErrorKind {
    /// Stable numeric code for this kind
    pub fn code(self) -> u16 {
        match self {
            ErrorKind::Validation => 1,
            ErrorKind::PermissionDenied => 2,
            ErrorKind::NotFound => 3,
            ErrorKind::Unsupported => 4,
            ErrorKind::ParseFailure => 5,
            ErrorKind::SubprocessFailure => 6,
            ErrorKind::VerificationFailure => 7,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::PermissionDenied => "permission denied",
            ErrorKind::NotFound => "not found",
            ErrorKind::Unsupported => "unsupported",
            ErrorKind::ParseFailure => "parse failure",
            ErrorKind::SubprocessFailure => "subprocess failure",
            ErrorKind::VerificationFailure => "verification failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Core error record for unipkg
///
/// Every error carries its kind, a human message and the package format it
/// relates to (`Unknown` when not format-specific). Errors from the utility
/// and subprocess layers are kept as the `source`.
#[derive(Error, Debug)]
#[error("[{format}] {message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    format: PackageFormat,
    #[source]
    source: Option<Cause>,
}

impl Error {
    pub fn new(kind: ErrorKind, format: PackageFormat, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            format,
            source: None,
        }
    }

    pub fn validation(format: PackageFormat, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, format, message)
    }

    pub fn permission_denied(format: PackageFormat, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PermissionDenied, format, message)
    }

    pub fn not_found(format: PackageFormat, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, format, message)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unsupported, PackageFormat::Unknown, message)
    }

    pub fn parse(format: PackageFormat, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseFailure, format, message)
    }

    pub fn subprocess(format: PackageFormat, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SubprocessFailure, format, message)
    }

    pub fn verification(format: PackageFormat, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::VerificationFailure, format, message)
    }

    /// Attach a lower-layer cause
    pub fn with_source(mut self, source: impl Into<Cause>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Wrap this error under a new message, keeping its kind and format
    pub fn context(self, message: impl Into<String>) -> Self {
        Self {
            kind: self.kind,
            message: message.into(),
            format: self.format,
            source: Some(Box::new(self)),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn code(&self) -> u16 {
        self.kind.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn format(&self) -> PackageFormat {
        self.format
    }
}

/// Result type alias using unipkg's Error type
pub type Result<T> = std::result::Result<T, Error>;
