// src/dag/state_manager.rs

//! State transitions on the package arena that fan out along graph edges.

use std::collections::HashSet;

use tracing::debug;

use crate::dag::package_info::{FailureReason, PackageId, PackageRecord, PackageState};

/// Applies dependency-driven transitions to the arena.
///
/// Only ever borrowed for the duration of a single completion event, so each
/// event's fan-out runs as one step.
pub struct StateManager<'a> {
    records: &'a mut [PackageRecord],
}

impl<'a> StateManager<'a> {
    pub fn new(records: &'a mut [PackageRecord]) -> Self {
        Self { records }
    }

    /// Record that `parent` succeeded: drop it from each child's unmet set.
    ///
    /// Returns the children that became ready and were moved to `Queued`.
    pub fn release_children(&mut self, parent: PackageId) -> Vec<PackageId> {
        let children = self.records[parent.0].children.clone();
        let mut released = Vec::new();

        for child in children {
            let record = &mut self.records[child.0];
            if !record.unmet.remove(&parent) {
                continue;
            }

            if record.unmet.is_empty() && record.state == PackageState::Awaiting {
                debug!(
                    package = %record.name,
                    "all dependencies satisfied; queueing"
                );
                record.state = PackageState::Queued;
                released.push(child);
            }
        }

        released
    }

    /// Fold every awaiting direct or transitive dependent of `failed` into
    /// the failed set.
    ///
    /// Dependents with other, successful parents are failed too: the failed
    /// dependency can never be satisfied in this run.
    pub fn fail_dependents(&mut self, failed: PackageId) -> Vec<PackageId> {
        let root_name = self.records[failed.0].name.clone();
        let mut stack: Vec<PackageId> = self.records[failed.0].children.clone();
        let mut visited: HashSet<PackageId> = HashSet::new();
        let mut newly_failed = Vec::new();

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }

            let record = &mut self.records[id.0];
            match record.state {
                PackageState::Awaiting | PackageState::Queued => {
                    debug!(
                        package = %record.name,
                        upstream = %root_name,
                        "marking dependent as failed due to upstream failure"
                    );
                    record.state =
                        PackageState::Failed(FailureReason::UpstreamFailed(root_name.clone()));
                    newly_failed.push(id);
                    stack.extend(record.children.iter().copied());
                }
                PackageState::InFlight | PackageState::Succeeded | PackageState::Failed(_) => {
                    // Unreachable for a true dependent; already accounted for.
                }
            }
        }

        newly_failed
    }

    /// Move every package that has not been dispatched into the failed set.
    pub fn abort_pending(&mut self) -> Vec<PackageId> {
        let mut aborted = Vec::new();
        for record in self.records.iter_mut() {
            if matches!(record.state, PackageState::Awaiting | PackageState::Queued) {
                record.state = PackageState::Failed(FailureReason::Aborted);
                aborted.push(record.id);
            }
        }
        aborted
    }
}
