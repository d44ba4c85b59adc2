// src/dag/mod.rs

//! Package dependency graph and scheduling.
//!
//! - [`graph`] derives parents/children for the packages selected for a run.
//! - [`batches`] partitions that graph into topological levels.
//! - [`scheduler`] is the per-run state machine deciding which packages are
//!   dispatched, and when.
//! - [`package_info`] holds arena records and the dispatch descriptor.
//! - [`scheduler_step`] defines the result type for scheduler steps.
//! - [`state_manager`] applies transitions that fan out along graph edges.

pub mod batches;
pub mod graph;
pub mod package_info;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;

pub use batches::topological_batches;
pub use graph::DependencyGraph;
pub use package_info::{FailureReason, PackageId, PackageRunState, ScheduledPackage};
pub use scheduler::{Progress, Scheduler};
pub use scheduler_step::SchedulerStep;
