// src/config/validate.rs

use std::collections::HashSet;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{Manifest, PackageSpec, RawManifest};
use crate::errors::{BuilddagError, Result};
use crate::types::PackageType;

impl TryFrom<RawManifest> for Manifest {
    type Error = BuilddagError;

    fn try_from(raw: RawManifest) -> std::result::Result<Self, Self::Error> {
        validate_raw_manifest(&raw)?;
        let packages = resolve_packages(&raw)?;
        Ok(Manifest::new_unchecked(raw.config, raw.build, packages))
    }
}

fn validate_raw_manifest(cfg: &RawManifest) -> Result<()> {
    ensure_has_packages(cfg)?;
    validate_global_config(cfg)?;
    validate_unique_names(cfg)?;
    validate_package_dependencies(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_packages(cfg: &RawManifest) -> Result<()> {
    if cfg.package.is_empty() {
        return Err(BuilddagError::ConfigError(
            "manifest must contain at least one [[package]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawManifest) -> Result<()> {
    if cfg.config.concurrency == 0 {
        return Err(BuilddagError::ConfigError(
            "[config].concurrency must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_unique_names(cfg: &RawManifest) -> Result<()> {
    let mut seen = HashSet::new();
    for pkg in cfg.package.iter() {
        if pkg.name.trim().is_empty() {
            return Err(BuilddagError::ConfigError(
                "package name must not be empty".to_string(),
            ));
        }
        if !seen.insert(pkg.name.as_str()) {
            return Err(BuilddagError::ConfigError(format!(
                "package '{}' is declared more than once",
                pkg.name
            )));
        }
    }
    Ok(())
}

fn validate_package_dependencies(cfg: &RawManifest) -> Result<()> {
    for pkg in cfg.package.iter() {
        for dep in pkg.dependencies.iter() {
            if dep == &pkg.name {
                return Err(BuilddagError::ConfigError(format!(
                    "package '{}' cannot depend on itself",
                    pkg.name
                )));
            }
            if cfg.find(dep).is_none() {
                return Err(BuilddagError::UnknownDependency {
                    package: pkg.name.clone(),
                    dependency: dep.clone(),
                });
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawManifest) -> Result<()> {
    // Edge direction: dependency -> dependent.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for pkg in cfg.package.iter() {
        graph.add_node(pkg.name.as_str());
    }

    for pkg in cfg.package.iter() {
        for dep in pkg.dependencies.iter() {
            graph.add_edge(dep.as_str(), pkg.name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(BuilddagError::DagCycle(format!(
            "cycle detected in package dependencies involving package '{}'",
            cycle.node_id()
        ))),
    }
}

fn resolve_packages(cfg: &RawManifest) -> Result<Vec<PackageSpec>> {
    cfg.package
        .iter()
        .map(|raw| {
            let kind = raw.kind.parse::<PackageType>().map_err(|_| {
                BuilddagError::UnknownPackageType {
                    package: raw.name.clone(),
                    value: raw.kind.clone(),
                }
            })?;

            Ok(PackageSpec {
                name: raw.name.clone(),
                kind,
                path: raw.effective_path().trim_end_matches('/').to_string(),
                dependencies: raw.dependencies.clone(),
            })
        })
        .collect()
}
