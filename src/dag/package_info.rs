// src/dag/package_info.rs

//! Per-package records kept by the scheduler, and the dispatch descriptor
//! handed to executors.

use std::collections::HashSet;
use std::fmt;

use crate::types::{PackageName, PackageType};

/// Stable handle into the scheduler's package arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId(pub(crate) usize);

/// Per-run state of a package (internal).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageState {
    /// Some in-run dependency has not succeeded yet.
    Awaiting,
    /// All dependencies succeeded; waiting for a free slot.
    Queued,
    /// Handed to the executor; result pending.
    InFlight,
    Succeeded,
    Failed(FailureReason),
}

impl PackageState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PackageState::Succeeded | PackageState::Failed(_))
    }
}

/// Why a package ended up in the failed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The executor reported an error for this package.
    Build(String),
    /// A direct or transitive dependency failed; never dispatched.
    UpstreamFailed(PackageName),
    /// The run was aborted before the package could be dispatched.
    Aborted,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Build(message) => write!(f, "build failed: {message}"),
            FailureReason::UpstreamFailed(upstream) => {
                write!(f, "not built: dependency '{upstream}' failed")
            }
            FailureReason::Aborted => f.write_str("not built: run aborted"),
        }
    }
}

/// Public, read-only view of a package's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageRunState {
    Awaiting,
    Queued,
    InFlight,
    Succeeded,
    Failed,
}

impl From<&PackageState> for PackageRunState {
    fn from(state: &PackageState) -> Self {
        match state {
            PackageState::Awaiting => PackageRunState::Awaiting,
            PackageState::Queued => PackageRunState::Queued,
            PackageState::InFlight => PackageRunState::InFlight,
            PackageState::Succeeded => PackageRunState::Succeeded,
            PackageState::Failed(_) => PackageRunState::Failed,
        }
    }
}

/// Arena record for one selected package.
#[derive(Debug, Clone)]
pub struct PackageRecord {
    pub id: PackageId,
    pub name: PackageName,
    pub kind: PackageType,
    pub path: String,
    pub priority: u32,
    pub parents: Vec<PackageId>,
    pub children: Vec<PackageId>,
    /// Parents that have not yet succeeded in this run.
    pub unmet: HashSet<PackageId>,
    pub state: PackageState,
}

/// Description of a package the scheduler wants built now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledPackage {
    pub name: PackageName,
    pub kind: PackageType,
    /// Source sub-directory relative to the project root.
    pub path: String,
    pub priority: u32,
}

impl ScheduledPackage {
    pub fn from_record(record: &PackageRecord) -> Self {
        Self {
            name: record.name.clone(),
            kind: record.kind,
            path: record.path.clone(),
            priority: record.priority,
        }
    }
}
