// src/diff/markers.rs

//! Last-known build markers: the revision each package was last built at.
//!
//! Markers come from two places:
//! - an optional override file (TOML) keyed by package name:
//!
//!   ```toml
//!   [markers]
//!   core = "4f1c2e9"
//!   ```
//!
//! - tags named `<package>_v<major>.<minor>.<patch>[.<build>]`; the highest
//!   version reachable from HEAD wins.
//!
//! Override entries take precedence over tags.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::diff::source_control::SourceControl;
use crate::errors::{BuilddagError, Result};
use crate::types::PackageName;

#[derive(Debug, Default, Deserialize)]
struct MarkerFile {
    #[serde(default)]
    markers: HashMap<PackageName, String>,
}

/// Lookup of per-package build markers.
#[derive(Debug, Clone, Default)]
pub struct MarkerStore {
    overrides: HashMap<PackageName, String>,
}

impl MarkerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overrides(overrides: HashMap<PackageName, String>) -> Self {
        Self { overrides }
    }

    /// Load overrides from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let file: MarkerFile = toml::from_str(contents)?;
        Ok(Self::with_overrides(file.markers))
    }

    pub fn override_for(&self, package: &str) -> Option<&str> {
        self.overrides.get(package).map(String::as_str)
    }

    /// Resolve the marker for `package`, consulting tags when no override
    /// exists. `None` means the package has never been built.
    pub async fn marker_for(
        &self,
        scm: &dyn SourceControl,
        package: &str,
    ) -> Result<Option<String>> {
        if let Some(rev) = self.override_for(package) {
            debug!(package, marker = rev, "using override marker");
            return Ok(Some(rev.to_string()));
        }

        let prefix = tag_prefix(package);
        let tags = scm.list_tags(&prefix).await?;
        let latest = latest_version_tag(package, &tags)?;
        debug!(package, marker = ?latest, candidates = tags.len(), "resolved tag marker");
        Ok(latest)
    }
}

pub fn tag_prefix(package: &str) -> String {
    format!("{package}_v")
}

/// Pick the highest-versioned `<package>_vX.Y.Z[.N]` tag out of `tags`.
///
/// Tags that do not match the pattern exactly (e.g. `core_v1.0.0-rc` or a
/// different package sharing the prefix) are ignored.
pub fn latest_version_tag(package: &str, tags: &[String]) -> Result<Option<String>> {
    let pattern = format!(
        r"^{}_v(\d+)\.(\d+)\.(\d+)(?:[.-](\d+))?$",
        regex::escape(package)
    );
    let re = Regex::new(&pattern).map_err(|e| {
        BuilddagError::ConfigError(format!("invalid tag pattern for '{package}': {e}"))
    })?;

    let latest = tags
        .iter()
        .filter_map(|tag| {
            let caps = re.captures(tag)?;
            let part = |i: usize| -> u64 {
                caps.get(i)
                    .and_then(|m| m.as_str().parse().ok())
                    .unwrap_or(0)
            };
            Some(((part(1), part(2), part(3), part(4)), tag))
        })
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, tag)| tag.clone());

    Ok(latest)
}
