// src/context.rs

//! Run-scoped settings, built once per invocation and shared by reference
//! with the selector, the runtime and every executor call.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::model::{BuildSection, Manifest};

#[derive(Debug, Clone)]
pub struct RunContext {
    /// Directory package paths are resolved against.
    pub project_root: PathBuf,
    /// Manifest location relative to `project_root`.
    pub manifest_file: PathBuf,
    /// Maximum number of builds in flight.
    pub concurrency: usize,
    /// Period of progress reports; `None` disables them.
    pub progress_interval: Option<Duration>,
    pub build: BuildSection,
}

impl RunContext {
    /// Derive the context from a manifest loaded from `manifest_path`.
    ///
    /// `concurrency_override` (e.g. from the CLI) wins over `[config]`.
    pub fn from_manifest(
        manifest: &Manifest,
        manifest_path: &Path,
        concurrency_override: Option<usize>,
    ) -> Self {
        let project_root = manifest_root_dir(manifest_path);
        let manifest_file = manifest_path
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| manifest_path.to_path_buf());

        let interval = manifest.config.progress_interval_secs;

        Self {
            project_root,
            manifest_file,
            concurrency: concurrency_override
                .unwrap_or(manifest.config.concurrency)
                .max(1),
            progress_interval: (interval > 0).then(|| Duration::from_secs(interval)),
            build: manifest.build.clone(),
        }
    }

    /// Context rooted at `project_root` with defaults, for library callers.
    pub fn new(project_root: impl Into<PathBuf>, concurrency: usize) -> Self {
        Self {
            project_root: project_root.into(),
            manifest_file: crate::config::default_manifest_path(),
            concurrency: concurrency.max(1),
            progress_interval: None,
            build: BuildSection::default(),
        }
    }

    pub fn package_dir(&self, relative: &str) -> PathBuf {
        self.project_root.join(relative)
    }
}

/// Figure out the project root for a manifest path.
///
/// - If the path has a non-empty parent (e.g. "repo/Builddag.toml"), use it.
/// - A bare filename falls back to the current working directory.
fn manifest_root_dir(manifest_path: &Path) -> PathBuf {
    match manifest_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
