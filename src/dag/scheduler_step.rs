// src/dag/scheduler_step.rs

//! Step-by-step execution result types for the scheduler.

use crate::dag::package_info::ScheduledPackage;
use crate::types::PackageName;

/// Structured result of a single scheduler "step".
///
/// Tests can step the scheduler by hand and make assertions about what each
/// event changed.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Packages handed to the executor as a result of this step.
    pub dispatched: Vec<ScheduledPackage>,
    /// Packages newly marked as failed in this step (the failing package
    /// itself first, then any dependents that were folded in).
    pub newly_failed: Vec<PackageName>,
    /// Whether every selected package is now terminal.
    pub run_finished: bool,
}

impl SchedulerStep {
    pub fn dispatched_names(&self) -> Vec<&str> {
        self.dispatched.iter().map(|p| p.name.as_str()).collect()
    }
}
