// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Configuration errors are fatal and surface before any build is
//! dispatched. Build failures are *not* represented here: they are values
//! ([`crate::exec::BuildError`]) that the scheduler folds into the report.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuilddagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Package '{package}' depends on unknown package '{dependency}'")]
    UnknownDependency { package: String, dependency: String },

    #[error("Package '{package}' has unknown type '{value}' (expected unlocked, source or data)")]
    UnknownPackageType { package: String, value: String },

    #[error("Cycle detected in package graph: {0}")]
    DagCycle(String),

    #[error("Source control error: {0}")]
    SourceControl(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BuilddagError {
    /// Whether this error is a configuration problem (as opposed to an
    /// infrastructure failure).
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            BuilddagError::ConfigError(_)
                | BuilddagError::UnknownDependency { .. }
                | BuilddagError::UnknownPackageType { .. }
                | BuilddagError::DagCycle(_)
                | BuilddagError::TomlError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BuilddagError>;
