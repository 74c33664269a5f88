// src/privilege.rs

//! Superuser check guarding every mutating operation

use crate::error::{Error, Result};
use crate::format::PackageFormat;
use nix::unistd::geteuid;

/// Whether the calling process runs with an effective uid of 0
pub fn is_superuser() -> bool {
    geteuid().is_root()
}

/// Source of the privilege decision
///
/// `Process` asks the operating system. `Fixed` pins the answer, which lets
/// callers that already know (and tests) avoid depending on the real euid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrivilegeGate {
    #[default]
    Process,
    Fixed(bool),
}

impl PrivilegeGate {
    pub fn is_superuser(&self) -> bool {
        match self {
            PrivilegeGate::Process => is_superuser(),
            PrivilegeGate::Fixed(value) => *value,
        }
    }

    /// Fail with PermissionDenied unless running as superuser
    pub fn require_superuser(&self, format: PackageFormat, operation: &str) -> Result<()> {
        if self.is_superuser() {
            Ok(())
        } else {
            Err(Error::permission_denied(
                format,
                format!("root privileges required for {}", operation),
            ))
        }
    }
}
