// src/engine/mod.rs

//! Orchestration engine for builddag.
//!
//! This module ties together:
//! - the batch sorter and the scheduler (seeding the first wave)
//! - the runtime event loop that reacts to:
//!   - build completion events
//!   - periodic progress ticks
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use std::time::Duration;

use crate::exec::{BuildArtifact, BuildError};
use crate::types::PackageName;

/// Result of one build action, as consumed by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Success(BuildArtifact),
    Failed(BuildError),
}

impl BuildOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, BuildOutcome::Success(_))
    }
}

impl From<Result<BuildArtifact, BuildError>> for BuildOutcome {
    fn from(result: Result<BuildArtifact, BuildError>) -> Self {
        match result {
            Ok(artifact) => BuildOutcome::Success(artifact),
            Err(error) => BuildOutcome::Failed(error),
        }
    }
}

/// Events flowing into the runtime from build tasks, timers and signals.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A dispatched build finished.
    BuildCompleted {
        package: PackageName,
        outcome: BuildOutcome,
        elapsed: Duration,
    },
    /// Time to report progress.
    ProgressTick,
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod runtime;

pub use core::{CoreCommand, CoreRuntime, CoreStep};
pub use runtime::{build_all, Runtime};
