// src/context.rs

//! Collaborators injected into every package entity

use crate::command::{CommandRunner, SystemRunner};
use crate::config::Config;
use crate::privilege::PrivilegeGate;
use std::sync::Arc;
use tracing::Span;

/// Shared handles for one top-level invocation
///
/// Holds the configuration, the runner used for native tools, the privilege
/// gate and the parent span that every operation logs under.
#[derive(Clone)]
pub struct Context {
    config: Arc<Config>,
    runner: Arc<dyn CommandRunner>,
    privilege: PrivilegeGate,
    span: Span,
}

impl Context {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            runner: Arc::new(SystemRunner),
            privilege: PrivilegeGate::Process,
            span: tracing::info_span!("unipkg"),
        }
    }

    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_privilege(mut self, privilege: PrivilegeGate) -> Self {
        self.privilege = privilege;
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    pub fn privilege(&self) -> PrivilegeGate {
        self.privilege
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("privilege", &self.privilege)
            .finish_non_exhaustive()
    }
}
