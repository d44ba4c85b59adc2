// src/dag/batches.rs

//! Level-by-level topological partitioning of a [`DependencyGraph`].

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::dag::graph::DependencyGraph;
use crate::errors::{BuilddagError, Result};
use crate::types::PackageName;

/// Partition the graph into ordered batches.
///
/// Batch `i` holds every package whose in-run dependencies all sit in
/// batches `< i`. Within a batch, packages keep manifest declaration order.
///
/// Fails with [`BuilddagError::DagCycle`] when extraction stalls with
/// packages left over.
pub fn topological_batches(graph: &DependencyGraph) -> Result<Vec<Vec<PackageName>>> {
    let mut in_degree: HashMap<&str, usize> = graph
        .packages()
        .iter()
        .map(|name| (name.as_str(), graph.parents_of(name).len()))
        .collect();

    let mut remaining: Vec<&str> = graph.packages().iter().map(String::as_str).collect();
    let mut batches = Vec::new();

    while !remaining.is_empty() {
        let batch: Vec<&str> = remaining
            .iter()
            .copied()
            .filter(|name| in_degree.get(name).copied().unwrap_or(0) == 0)
            .collect();

        if batch.is_empty() {
            let member = find_cycle_member(graph, &remaining);
            return Err(BuilddagError::DagCycle(format!(
                "cycle detected in package graph involving package '{}' ({} package(s) could not be ordered: {})",
                member,
                remaining.len(),
                remaining.join(", ")
            )));
        }

        let extracted: HashSet<&str> = batch.iter().copied().collect();
        remaining.retain(|name| !extracted.contains(name));

        for name in batch.iter() {
            for child in graph.children_of(name) {
                if let Some(deg) = in_degree.get_mut(child.as_str()) {
                    *deg = deg.saturating_sub(1);
                }
            }
        }

        debug!(batch = batches.len(), packages = ?batch, "computed batch");
        batches.push(batch.into_iter().map(str::to_string).collect());
    }

    Ok(batches)
}

/// Walk parent edges among the stalled packages until a package repeats.
///
/// Every stalled package has at least one stalled parent, so the walk always
/// closes a loop; the repeated package lies on a cycle.
fn find_cycle_member<'a>(graph: &'a DependencyGraph, stalled: &[&'a str]) -> &'a str {
    let stalled_set: HashSet<&str> = stalled.iter().copied().collect();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut current = stalled[0];

    loop {
        if !seen.insert(current) {
            return current;
        }
        let next = graph
            .parents_of(current)
            .iter()
            .map(String::as_str)
            .find(|p| stalled_set.contains(p));

        match next {
            Some(parent) => current = parent,
            None => return current,
        }
    }
}
