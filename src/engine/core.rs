// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels
//! - handing `ScheduledPackage`s to the build executor
//! - handling Ctrl+C / shutdown
//!
//! The core can be unit tested without any Tokio, channels or processes.

use std::time::Duration;

use tracing::{debug, info};

use crate::dag::{Progress, ScheduledPackage, Scheduler};
use crate::engine::RuntimeEvent;
use crate::report::BuildReport;
use crate::types::PackageName;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Hand these packages to the build executor.
    Dispatch(Vec<ScheduledPackage>),
    /// Emit an observational progress report.
    ReportProgress(Progress),
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer loop should keep waiting for events.
    pub keep_running: bool,
}

/// Pure core runtime state.
///
/// This owns the scheduler and the first batch it is seeded with. It has
/// **no** channels, no Tokio types, and performs no IO.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    first_batch: Vec<PackageName>,
}

impl CoreRuntime {
    /// `batches` is the sorter's output; only batch 0 seeds the scheduler,
    /// later waves follow from completions.
    pub fn new(scheduler: Scheduler, batches: Vec<Vec<PackageName>>) -> Self {
        let first_batch = batches.into_iter().next().unwrap_or_default();
        Self {
            scheduler,
            first_batch,
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn is_finished(&self) -> bool {
        self.scheduler.is_finished()
    }

    /// Dispatch the initial wave.
    pub fn start(&mut self) -> CoreStep {
        let step = self.scheduler.start(&self.first_batch);
        let mut commands = Vec::new();
        if !step.dispatched.is_empty() {
            commands.push(CoreCommand::Dispatch(step.dispatched));
        }
        CoreStep {
            commands,
            keep_running: !step.run_finished,
        }
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        let mut commands = Vec::new();

        match event {
            RuntimeEvent::BuildCompleted {
                package,
                outcome,
                elapsed,
            } => {
                let step = self.scheduler.on_completion(&package, outcome, elapsed);
                if !step.newly_failed.is_empty() {
                    debug!(failed = ?step.newly_failed, "packages moved to failed set");
                }
                if !step.dispatched.is_empty() {
                    commands.push(CoreCommand::Dispatch(step.dispatched));
                }
            }
            RuntimeEvent::ProgressTick => {
                commands.push(CoreCommand::ReportProgress(self.scheduler.progress()));
            }
            RuntimeEvent::ShutdownRequested => {
                let step = self.scheduler.abort();
                info!(
                    aborted = step.newly_failed.len(),
                    in_flight = self.scheduler.in_flight_count(),
                    "shutdown requested; draining in-flight builds"
                );
            }
        }

        CoreStep {
            commands,
            keep_running: !self.scheduler.is_finished(),
        }
    }

    pub fn into_report(self, elapsed: Duration) -> BuildReport {
        self.scheduler.into_report(elapsed)
    }
}
