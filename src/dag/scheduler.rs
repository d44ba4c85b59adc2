use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::dag::graph::DependencyGraph;
use crate::dag::package_info::{
    FailureReason, PackageId, PackageRecord, PackageRunState, PackageState, ScheduledPackage,
};
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::StateManager;
use crate::engine::BuildOutcome;
use crate::report::{BuildReport, BuildResult, FailedPackage};
use crate::types::PackageName;

/// Observational snapshot of a run in progress. Carries no control semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Progress {
    pub in_flight: Vec<PackageName>,
    /// Packages not yet dispatched (dependencies unmet, or waiting for a slot).
    pub awaiting: Vec<PackageName>,
    pub succeeded: usize,
    pub failed: usize,
}

/// Bounded-concurrency, priority-ordered dispatcher over a package arena.
///
/// It is responsible for:
/// - tracking each package's unmet dependencies
/// - dispatching packages whose dependencies all succeeded, highest priority
///   first, never more than `concurrency` at a time
/// - recording results and folding dependents of failures into the failed set
///
/// The scheduler is synchronous and performs no IO. Every method call is one
/// atomic step: the caller feeds completion events one at a time and receives
/// the packages to dispatch next.
#[derive(Debug)]
pub struct Scheduler {
    records: Vec<PackageRecord>,
    index: HashMap<PackageName, PackageId>,
    /// Queued packages, ordered by (priority, earliest declaration).
    ready: BinaryHeap<(u32, Reverse<PackageId>)>,
    concurrency: usize,
    in_flight: usize,
    started: bool,
    aborted: bool,
    generated: Vec<BuildResult>,
    failed: Vec<FailedPackage>,
}

impl Scheduler {
    /// Build the arena for the packages in `graph`.
    ///
    /// `concurrency` is clamped to at least 1.
    pub fn new(graph: &DependencyGraph, concurrency: usize) -> Self {
        let index: HashMap<PackageName, PackageId> = graph
            .packages()
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), PackageId(i)))
            .collect();

        let ids_of = |names: &[PackageName]| -> Vec<PackageId> {
            names.iter().filter_map(|n| index.get(n).copied()).collect()
        };

        let records = graph
            .packages()
            .iter()
            .enumerate()
            .filter_map(|(i, name)| {
                let spec = graph.spec(name)?;
                let children = ids_of(graph.children_of(name));
                let parents = ids_of(graph.parents_of(name));
                Some(PackageRecord {
                    id: PackageId(i),
                    name: name.clone(),
                    kind: spec.kind,
                    path: spec.path.clone(),
                    priority: spec.kind.priority(children.len()),
                    unmet: parents.iter().copied().collect(),
                    parents,
                    children,
                    state: PackageState::Awaiting,
                })
            })
            .collect();

        Self {
            records,
            index,
            ready: BinaryHeap::new(),
            concurrency: concurrency.max(1),
            in_flight: 0,
            started: false,
            aborted: false,
            generated: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of packages currently handed to the executor.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Whether every package has reached a terminal state.
    pub fn is_finished(&self) -> bool {
        self.records.iter().all(|r| r.state.is_terminal())
    }

    pub fn state_of(&self, package: &str) -> Option<PackageRunState> {
        let id = self.index.get(package)?;
        Some((&self.records[id.0].state).into())
    }

    pub fn failure_reason_of(&self, package: &str) -> Option<&FailureReason> {
        let id = self.index.get(package)?;
        match &self.records[id.0].state {
            PackageState::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    /// Names of the dependencies `package` is still waiting on.
    pub fn unmet_dependencies_of(&self, package: &str) -> Option<Vec<&str>> {
        let id = self.index.get(package)?;
        let record = &self.records[id.0];
        let mut unmet: Vec<PackageId> = record.unmet.iter().copied().collect();
        unmet.sort();
        Some(
            unmet
                .into_iter()
                .map(|p| self.records[p.0].name.as_str())
                .collect(),
        )
    }

    pub fn package_names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.name.as_str())
    }

    pub fn progress(&self) -> Progress {
        let mut progress = Progress::default();
        for record in self.records.iter() {
            match record.state {
                PackageState::InFlight => progress.in_flight.push(record.name.clone()),
                PackageState::Awaiting | PackageState::Queued => {
                    progress.awaiting.push(record.name.clone())
                }
                PackageState::Succeeded => progress.succeeded += 1,
                PackageState::Failed(_) => progress.failed += 1,
            }
        }
        progress
    }

    /// Seed the run with the first batch and dispatch what fits.
    ///
    /// Every package in `first_batch` must have no in-run dependencies;
    /// entries that do, or that are unknown, are skipped with a warning.
    /// Calling `start` more than once is a no-op.
    pub fn start(&mut self, first_batch: &[PackageName]) -> SchedulerStep {
        if self.started {
            warn!("scheduler already started; ignoring start request");
            return self.step(Vec::new(), Vec::new());
        }
        self.started = true;

        info!(
            packages = self.records.len(),
            concurrency = self.concurrency,
            initial = first_batch.len(),
            "scheduler: starting run"
        );

        let mut seen: HashSet<PackageId> = HashSet::new();
        for name in first_batch {
            let Some(&id) = self.index.get(name) else {
                warn!(package = %name, "initial batch names unknown package; ignoring");
                continue;
            };
            if !seen.insert(id) {
                continue;
            }

            let record = &mut self.records[id.0];
            if !record.unmet.is_empty() {
                warn!(
                    package = %record.name,
                    "initial batch contains package with unmet dependencies; ignoring"
                );
                continue;
            }
            record.state = PackageState::Queued;
            self.ready.push((record.priority, Reverse(id)));
        }

        let dispatched = self.fill_slots();
        self.step(dispatched, Vec::new())
    }

    /// Record the result of an in-flight package and dispatch whatever it
    /// unblocked.
    ///
    /// Completions for unknown packages, or packages that are not in flight,
    /// are ignored.
    pub fn on_completion(
        &mut self,
        package: &str,
        outcome: BuildOutcome,
        elapsed: Duration,
    ) -> SchedulerStep {
        let Some(&id) = self.index.get(package) else {
            warn!(package = %package, "completion for unknown package; ignoring");
            return self.step(Vec::new(), Vec::new());
        };

        if self.records[id.0].state != PackageState::InFlight {
            warn!(
                package = %package,
                state = ?self.records[id.0].state,
                "completion for package that is not in flight; ignoring"
            );
            return self.step(Vec::new(), Vec::new());
        }

        self.in_flight -= 1;
        let mut newly_failed = Vec::new();

        match outcome {
            BuildOutcome::Success(artifact) => {
                let record = &mut self.records[id.0];
                record.state = PackageState::Succeeded;
                info!(
                    package = %record.name,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "package built successfully"
                );
                self.generated.push(BuildResult {
                    name: record.name.clone(),
                    kind: record.kind,
                    artifact,
                    elapsed,
                });

                let released = StateManager::new(&mut self.records).release_children(id);
                for child in released {
                    self.ready.push((self.records[child.0].priority, Reverse(child)));
                }
            }
            BuildOutcome::Failed(error) => {
                let record = &mut self.records[id.0];
                record.state = PackageState::Failed(FailureReason::Build(error.message.clone()));
                warn!(
                    package = %record.name,
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %error,
                    "package build failed; failing dependents in this run"
                );
                self.failed.push(FailedPackage {
                    name: record.name.clone(),
                    reason: FailureReason::Build(error.message),
                    elapsed: Some(elapsed),
                });
                newly_failed.push(record.name.clone());

                let dependents = StateManager::new(&mut self.records).fail_dependents(id);
                newly_failed.extend(self.record_failures(dependents));
            }
        }

        let dispatched = self.fill_slots();
        self.step(dispatched, newly_failed)
    }

    /// Stop dispatching: every package not yet handed to the executor moves
    /// to the failed set. In-flight builds still report their results.
    pub fn abort(&mut self) -> SchedulerStep {
        if !self.aborted {
            info!(
                in_flight = self.in_flight,
                "scheduler: aborting run; pending packages will not be built"
            );
        }
        self.aborted = true;
        self.ready.clear();

        let aborted = StateManager::new(&mut self.records).abort_pending();
        let newly_failed = self.record_failures(aborted);
        self.step(Vec::new(), newly_failed)
    }

    /// Consume the scheduler and produce the aggregate report.
    ///
    /// Packages that never reached a terminal state (only possible if the
    /// caller stops feeding completions) are reported as aborted.
    pub fn into_report(mut self, elapsed: Duration) -> BuildReport {
        let leftovers: Vec<PackageId> = self
            .records
            .iter()
            .filter(|r| !r.state.is_terminal())
            .map(|r| r.id)
            .collect();

        for id in leftovers {
            let record = &mut self.records[id.0];
            warn!(package = %record.name, state = ?record.state, "package left unfinished");
            record.state = PackageState::Failed(FailureReason::Aborted);
            self.failed.push(FailedPackage {
                name: record.name.clone(),
                reason: FailureReason::Aborted,
                elapsed: None,
            });
        }

        BuildReport {
            generated: self.generated,
            failed: self.failed,
            elapsed,
        }
    }

    /// Append newly failed, never-dispatched packages to the failed list.
    fn record_failures(&mut self, ids: Vec<PackageId>) -> Vec<PackageName> {
        let mut names = Vec::with_capacity(ids.len());
        for id in ids {
            let record = &self.records[id.0];
            if let PackageState::Failed(reason) = &record.state {
                self.failed.push(FailedPackage {
                    name: record.name.clone(),
                    reason: reason.clone(),
                    elapsed: None,
                });
                names.push(record.name.clone());
            }
        }
        names
    }

    /// Pop ready packages while capacity remains and mark them in flight.
    fn fill_slots(&mut self) -> Vec<ScheduledPackage> {
        let mut dispatched = Vec::new();
        if self.aborted {
            return dispatched;
        }

        while self.in_flight < self.concurrency {
            let Some((_, Reverse(id))) = self.ready.pop() else {
                break;
            };

            let record = &mut self.records[id.0];
            if record.state != PackageState::Queued {
                continue;
            }

            debug!(
                package = %record.name,
                priority = record.priority,
                "dependencies satisfied; dispatching"
            );
            record.state = PackageState::InFlight;
            self.in_flight += 1;
            dispatched.push(ScheduledPackage::from_record(record));
        }

        dispatched
    }

    fn step(
        &self,
        dispatched: Vec<ScheduledPackage>,
        newly_failed: Vec<PackageName>,
    ) -> SchedulerStep {
        SchedulerStep {
            dispatched,
            newly_failed,
            run_finished: self.is_finished(),
        }
    }
}
