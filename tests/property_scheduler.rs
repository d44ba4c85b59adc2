// tests/property_scheduler.rs

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use proptest::prelude::*;

use builddag::dag::{topological_batches, DependencyGraph, PackageRunState, Scheduler};
use builddag::engine::BuildOutcome;
use builddag::exec::{BuildArtifact, BuildError};
use builddag_test_utils::builders::ManifestBuilder;

// Strategy to generate a valid package graph.
// We ensure acyclicity by only allowing package N to depend on packages 0..N-1.
fn graph_strategy(max_packages: usize) -> impl Strategy<Value = DependencyGraph> {
    (1..=max_packages).prop_flat_map(|count| {
        let deps = proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..count),
            count,
        );
        let kinds = proptest::collection::vec(0..3u8, count);

        (deps, kinds).prop_map(move |(raw_deps, kinds)| {
            let mut builder = ManifestBuilder::new();
            for (i, potential) in raw_deps.into_iter().enumerate() {
                let name = format!("pkg_{i}");
                let deps: HashSet<usize> = if i == 0 {
                    HashSet::new()
                } else {
                    potential.into_iter().map(|d| d % i).collect()
                };
                let mut deps: Vec<String> = deps.into_iter().map(|d| format!("pkg_{d}")).collect();
                deps.sort();
                let deps: Vec<&str> = deps.iter().map(String::as_str).collect();

                builder = match kinds[i] {
                    0 => builder.unlocked(&name, &deps),
                    1 => builder.source(&name, &deps),
                    _ => builder.data(&name, &deps),
                };
            }
            builder.build_graph().1
        })
    })
}

fn ancestors_of(graph: &DependencyGraph, name: &str) -> HashSet<String> {
    let mut seen = HashSet::new();
    let mut stack: Vec<String> = graph.parents_of(name).to_vec();
    while let Some(p) = stack.pop() {
        if seen.insert(p.clone()) {
            stack.extend(graph.parents_of(&p).iter().cloned());
        }
    }
    seen
}

proptest! {
    #[test]
    fn batches_partition_the_selected_set(graph in graph_strategy(12)) {
        let batches = topological_batches(&graph).unwrap();
        let flat: Vec<&String> = batches.iter().flatten().collect();
        let unique: HashSet<&String> = flat.iter().copied().collect();

        prop_assert_eq!(flat.len(), graph.len());
        prop_assert_eq!(unique.len(), graph.len());
        prop_assert!(batches.iter().all(|b| !b.is_empty()));
    }

    #[test]
    fn simulated_runs_respect_scheduling_invariants(
        graph in graph_strategy(12),
        concurrency in 1..4usize,
        picks in proptest::collection::vec(any::<usize>(), 64),
        failing_indices in proptest::collection::vec(0..12usize, 0..4),
    ) {
        let names: Vec<String> = graph.packages().to_vec();
        let failing: HashSet<String> = failing_indices
            .iter()
            .filter(|&&i| i < names.len())
            .map(|&i| names[i].clone())
            .collect();

        let batches = topological_batches(&graph).unwrap();
        let first = batches.into_iter().next().unwrap_or_default();
        let mut scheduler = Scheduler::new(&graph, concurrency);

        let mut executing: Vec<String> = scheduler.start(&first)
            .dispatched
            .into_iter()
            .map(|p| p.name)
            .collect();
        let mut dispatched_order: Vec<String> = executing.clone();
        let mut succeeded_at: HashMap<String, usize> = HashMap::new();
        let mut dispatched_at: HashMap<String, usize> =
            executing.iter().map(|n| (n.clone(), 0)).collect();

        let mut step = 0usize;
        let max_steps = 1000; // Prevent infinite loops in test logic
        while !executing.is_empty() && step < max_steps {
            step += 1;

            // Concurrency bound.
            prop_assert!(executing.len() <= concurrency);
            prop_assert_eq!(scheduler.in_flight_count(), executing.len());

            let pick = picks[step % picks.len()] % executing.len();
            let package = executing.remove(pick);

            let outcome = if failing.contains(&package) {
                BuildOutcome::Failed(BuildError::new("scripted"))
            } else {
                succeeded_at.insert(package.clone(), step);
                BuildOutcome::Success(BuildArtifact::empty())
            };

            let result = scheduler.on_completion(&package, outcome, Duration::from_millis(1));
            for p in result.dispatched {
                prop_assert!(!dispatched_at.contains_key(&p.name), "{} dispatched twice", p.name);
                dispatched_at.insert(p.name.clone(), step);
                dispatched_order.push(p.name.clone());
                executing.push(p.name);
            }
        }

        prop_assert!(step < max_steps, "Simulation timed out - infinite loop?");
        prop_assert!(scheduler.is_finished(), "run stalled with nothing in flight");

        // Dispatch causality: every parent succeeded strictly before dispatch.
        for name in dispatched_order.iter() {
            for parent in graph.parents_of(name) {
                let Some(&done) = succeeded_at.get(parent) else {
                    return Err(TestCaseError::fail(format!(
                        "{name} dispatched but {parent} never succeeded"
                    )));
                };
                prop_assert!(done <= dispatched_at[name]);
                prop_assert!(done > 0);
            }
        }

        // Failure cascade: descendants of failures are failed and never dispatched.
        for name in names.iter() {
            let ancestors = ancestors_of(&graph, name);
            if ancestors.iter().any(|a| failing.contains(a) && dispatched_at.contains_key(a)) {
                prop_assert_eq!(scheduler.state_of(name), Some(PackageRunState::Failed));
                prop_assert!(!dispatched_at.contains_key(name));
            }
        }

        // Every package lands in exactly one of generated / failed.
        let report = scheduler.into_report(Duration::ZERO);
        let generated: HashSet<&str> = report.generated_names().into_iter().collect();
        let failed: HashSet<&str> = report.failed_names().into_iter().collect();
        prop_assert_eq!(report.total(), names.len());
        prop_assert_eq!(generated.len() + failed.len(), names.len());
        prop_assert!(generated.is_disjoint(&failed));
        for name in names.iter() {
            prop_assert!(generated.contains(name.as_str()) || failed.contains(name.as_str()));
        }
    }
}
