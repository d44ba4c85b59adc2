// src/exec/backend.rs

//! Pluggable build executor abstraction.
//!
//! The runtime talks to a `BuildExecutor` instead of running commands itself.
//! Production uses [`CommandExecutor`](super::CommandExecutor); tests swap in
//! fakes that record dispatches and script outcomes.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::context::RunContext;
use crate::dag::ScheduledPackage;

/// Opaque result of a successful package build.
///
/// The scheduler never inspects it; it is carried through to the report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildArtifact {
    pub descriptor: Option<String>,
}

impl BuildArtifact {
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self {
            descriptor: Some(descriptor.into()),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// A build action for one package failed.
///
/// The scheduler treats every `BuildError` as terminal for that package and
/// does not look at the cause.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct BuildError {
    pub message: String,
}

impl BuildError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for BuildError {
    fn from(err: anyhow::Error) -> Self {
        Self::new(format!("{err:#}"))
    }
}

/// Boxed future returned by [`BuildExecutor::build`].
pub type BuildFuture<'a> =
    Pin<Box<dyn Future<Output = Result<BuildArtifact, BuildError>> + Send + 'a>>;

/// Trait abstracting how a single package is built.
///
/// Implementations may be long-running and IO-bound. Each call is driven on
/// its own Tokio task, so an implementation must be shareable across tasks.
pub trait BuildExecutor: Send + Sync + 'static {
    fn build<'a>(&'a self, package: &'a ScheduledPackage, context: &'a RunContext)
    -> BuildFuture<'a>;
}
