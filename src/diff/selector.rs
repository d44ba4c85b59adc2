// src/diff/selector.rs

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::loader::parse_raw;
use crate::config::model::{Manifest, PackageSpec};
use crate::diff::markers::MarkerStore;
use crate::diff::source_control::SourceControl;
use crate::errors::Result;
use crate::types::PackageName;

/// Why a package was selected for a diff run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionReason {
    /// No marker: the package has never been built.
    NoMarker,
    /// A file under the package's path changed since the marker.
    SourceChanged { path: String },
    /// The package's manifest entry differs from the one at the marker.
    ManifestEntryChanged,
}

/// A package picked for this run, with the reason it was picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub name: PackageName,
    pub reason: SelectionReason,
}

/// Narrows the manifest to packages changed since their last build marker.
pub struct ChangeSelector<'a> {
    scm: &'a dyn SourceControl,
    markers: &'a MarkerStore,
    /// Manifest location relative to the project root.
    manifest_file: String,
}

impl<'a> ChangeSelector<'a> {
    pub fn new(
        scm: &'a dyn SourceControl,
        markers: &'a MarkerStore,
        manifest_file: impl AsRef<Path>,
    ) -> Self {
        Self {
            scm,
            markers,
            manifest_file: manifest_file.as_ref().to_string_lossy().replace('\\', "/"),
        }
    }

    /// Names of the selected packages, in manifest order.
    pub async fn select(&self, manifest: &Manifest) -> Result<Vec<PackageName>> {
        let selections = self.select_with_reasons(manifest).await?;
        Ok(selections.into_iter().map(|s| s.name).collect())
    }

    /// Decide, in manifest order, which packages changed.
    ///
    /// Any source-control failure aborts selection.
    pub async fn select_with_reasons(&self, manifest: &Manifest) -> Result<Vec<Selection>> {
        let head = self.scm.head().await?;
        let mut diffs: HashMap<String, Vec<String>> = HashMap::new();
        let mut selected = Vec::new();

        for spec in manifest.packages() {
            let Some(marker) = self.markers.marker_for(self.scm, &spec.name).await? else {
                info!(package = %spec.name, "no build marker; selecting");
                selected.push(Selection {
                    name: spec.name.clone(),
                    reason: SelectionReason::NoMarker,
                });
                continue;
            };

            if !diffs.contains_key(&marker) {
                let changed = self.scm.changed_paths(&marker, &head).await?;
                diffs.insert(marker.clone(), changed);
            }
            let changed = diffs.get(&marker).map(Vec::as_slice).unwrap_or(&[]);

            match self.change_reason(spec, &marker, changed).await? {
                Some(reason) => {
                    info!(
                        package = %spec.name,
                        marker = %marker,
                        ?reason,
                        "package changed; selecting"
                    );
                    selected.push(Selection {
                        name: spec.name.clone(),
                        reason,
                    });
                }
                None => {
                    debug!(package = %spec.name, marker = %marker, "package unchanged; skipping");
                }
            }
        }

        Ok(selected)
    }

    async fn change_reason(
        &self,
        spec: &PackageSpec,
        marker: &str,
        changed: &[String],
    ) -> Result<Option<SelectionReason>> {
        if let Some(path) = changed.iter().find(|p| is_under(p, &spec.path)) {
            return Ok(Some(SelectionReason::SourceChanged { path: path.clone() }));
        }

        if !spec.kind.rebuilds_on_manifest_change() {
            return Ok(None);
        }

        if !changed.iter().any(|p| p == &self.manifest_file) {
            return Ok(None);
        }

        let Some(previous) = self.scm.file_at(marker, &self.manifest_file).await? else {
            return Ok(Some(SelectionReason::ManifestEntryChanged));
        };

        let entry_changed = match parse_raw(&previous) {
            Ok(old) => old.find(&spec.name).is_none_or(|raw| !spec.matches_raw(raw)),
            Err(e) => {
                warn!(
                    package = %spec.name,
                    marker,
                    error = %e,
                    "manifest at marker is unreadable; treating entry as changed"
                );
                true
            }
        };

        Ok(entry_changed.then_some(SelectionReason::ManifestEntryChanged))
    }
}

/// Whether `changed` (a project-relative file path) lies inside `package_path`.
fn is_under(changed: &str, package_path: &str) -> bool {
    let package_path = package_path.trim_start_matches("./");
    if package_path.is_empty() || package_path == "." {
        return true;
    }
    Path::new(changed).starts_with(Path::new(package_path))
}
