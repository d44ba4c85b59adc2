// src/report.rs

//! Aggregate outcome of a build run.

use std::time::Duration;

use crate::dag::FailureReason;
use crate::exec::BuildArtifact;
use crate::types::{PackageName, PackageType};

/// Immutable record of one successful package build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildResult {
    pub name: PackageName,
    pub kind: PackageType,
    pub artifact: BuildArtifact,
    pub elapsed: Duration,
}

/// A package that ended the run in the failed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedPackage {
    pub name: PackageName,
    pub reason: FailureReason,
    /// Time spent building; `None` when the package was never dispatched.
    pub elapsed: Option<Duration>,
}

/// Every selected package appears exactly once, in either `generated`
/// (in completion order) or `failed`.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub generated: Vec<BuildResult>,
    pub failed: Vec<FailedPackage>,
    pub elapsed: Duration,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn generated_names(&self) -> Vec<&str> {
        self.generated.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn failed_names(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn total(&self) -> usize {
        self.generated.len() + self.failed.len()
    }
}
