// src/dag/graph.rs

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::config::model::{Manifest, PackageSpec};
use crate::errors::{BuilddagError, Result};
use crate::types::PackageName;

/// Internal node structure: the package declaration plus in-run adjacency.
#[derive(Debug, Clone)]
struct GraphNode {
    spec: PackageSpec,
    /// Selected packages this one depends on.
    parents: Vec<PackageName>,
    /// Selected packages depending on this one.
    children: Vec<PackageName>,
}

/// Dependency graph over the packages selected for a run.
///
/// Every selected package has an entry, including those without
/// dependencies. Dependencies on packages that exist in the manifest but are
/// not part of this run are treated as already satisfied and do not appear
/// in `parents`.
///
/// Construction does not check for cycles; that is the job of
/// [`topological_batches`](crate::dag::batches::topological_batches).
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// Selected package names in manifest declaration order.
    order: Vec<PackageName>,
    nodes: HashMap<PackageName, GraphNode>,
}

impl DependencyGraph {
    /// Build the graph for `selected` out of a validated manifest.
    ///
    /// `selected` may be in any order; the graph always follows manifest
    /// declaration order.
    pub fn build(selected: &[PackageName], manifest: &Manifest) -> Result<Self> {
        let wanted: HashSet<&str> = selected.iter().map(String::as_str).collect();

        for name in selected {
            if !manifest.contains(name) {
                return Err(BuilddagError::ConfigError(format!(
                    "selected package '{name}' is not declared in the manifest"
                )));
            }
        }

        let specs: Vec<PackageSpec> = manifest
            .packages()
            .iter()
            .filter(|p| wanted.contains(p.name.as_str()))
            .cloned()
            .collect();

        Self::assemble(specs, |dep| manifest.contains(dep))
    }

    /// Build a graph in which `specs` form the whole known package universe
    /// and all of them are selected.
    pub fn from_specs(specs: Vec<PackageSpec>) -> Result<Self> {
        let known: HashSet<PackageName> = specs.iter().map(|s| s.name.clone()).collect();
        Self::assemble(specs, |dep| known.contains(dep))
    }

    fn assemble(specs: Vec<PackageSpec>, is_known: impl Fn(&str) -> bool) -> Result<Self> {
        let order: Vec<PackageName> = specs.iter().map(|s| s.name.clone()).collect();
        let in_run: HashSet<&str> = order.iter().map(String::as_str).collect();

        let mut nodes: HashMap<PackageName, GraphNode> = HashMap::new();

        // First pass: parents restricted to the selected set.
        for spec in specs.iter() {
            let mut parents = Vec::new();
            for dep in spec.dependencies.iter() {
                if !is_known(dep) {
                    return Err(BuilddagError::UnknownDependency {
                        package: spec.name.clone(),
                        dependency: dep.clone(),
                    });
                }
                if in_run.contains(dep.as_str()) {
                    if !parents.contains(dep) {
                        parents.push(dep.clone());
                    }
                } else {
                    debug!(
                        package = %spec.name,
                        dependency = %dep,
                        "dependency not selected for this run; treating as satisfied"
                    );
                }
            }

            nodes.insert(
                spec.name.clone(),
                GraphNode {
                    spec: spec.clone(),
                    parents,
                    children: Vec::new(),
                },
            );
        }

        // Second pass: children, visited in declaration order so each
        // children list is ordered too.
        for name in order.iter() {
            let parents = nodes
                .get(name)
                .map(|n| n.parents.clone())
                .unwrap_or_default();

            for parent in parents {
                if let Some(parent_node) = nodes.get_mut(&parent) {
                    parent_node.children.push(name.clone());
                }
            }
        }

        Ok(Self { order, nodes })
    }

    /// Selected package names in declaration order.
    pub fn packages(&self) -> &[PackageName] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn spec(&self, name: &str) -> Option<&PackageSpec> {
        self.nodes.get(name).map(|n| &n.spec)
    }

    /// Packages `name` depends on within this run.
    pub fn parents_of(&self, name: &str) -> &[PackageName] {
        self.nodes
            .get(name)
            .map(|n| n.parents.as_slice())
            .unwrap_or(&[])
    }

    /// Packages within this run that depend on `name`.
    pub fn children_of(&self, name: &str) -> &[PackageName] {
        self.nodes
            .get(name)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }
}
