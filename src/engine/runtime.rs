// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::anyhow;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::context::RunContext;
use crate::dag::{topological_batches, DependencyGraph, Progress, ScheduledPackage, Scheduler};
use crate::errors::Result;
use crate::exec::{BuildError, BuildExecutor};
use crate::report::BuildReport;

use super::core::CoreRuntime;
use super::{BuildOutcome, CoreCommand, CoreStep, RuntimeEvent};

/// Drives the scheduler in response to `RuntimeEvent`s, and delegates the
/// actual build actions to a `BuildExecutor`.
///
/// This is an IO shell around `CoreRuntime`, which holds all scheduling
/// semantics. Events are processed strictly one at a time, so the dispatches
/// triggered by one completion are decided before the next completion is
/// looked at.
pub struct Runtime<E: BuildExecutor> {
    core: CoreRuntime,
    event_tx: mpsc::Sender<RuntimeEvent>,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: Arc<E>,
    context: Arc<RunContext>,
}

impl<E: BuildExecutor> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl<E: BuildExecutor> Runtime<E> {
    pub fn new(core: CoreRuntime, executor: E, context: RunContext) -> Self {
        let (event_tx, event_rx) = mpsc::channel::<RuntimeEvent>(64);
        Self {
            core,
            event_tx,
            event_rx,
            executor: Arc::new(executor),
            context: Arc::new(context),
        }
    }

    /// Sender for injecting events from outside (e.g. a Ctrl-C handler).
    pub fn event_sender(&self) -> mpsc::Sender<RuntimeEvent> {
        self.event_tx.clone()
    }

    /// Main event loop.
    ///
    /// - Dispatches the initial wave.
    /// - Feeds completions, progress ticks and shutdown requests into the
    ///   core, executing the commands it returns.
    /// - Returns once every selected package is terminal.
    pub async fn run(mut self) -> Result<BuildReport> {
        let started = Instant::now();
        info!(
            packages = self.core.scheduler().len(),
            concurrency = self.context.concurrency,
            "builddag runtime started"
        );

        let step = self.core.start();
        let mut keep_running = self.execute(step);

        let ticker = self
            .context
            .progress_interval
            .filter(|_| keep_running)
            .map(|period| spawn_ticker(self.event_tx.clone(), period));

        while keep_running {
            let Some(event) = self.event_rx.recv().await else {
                if let Some(t) = &ticker {
                    t.abort();
                }
                return Err(anyhow!(
                    "runtime event channel closed with {} build(s) in flight",
                    self.core.scheduler().in_flight_count()
                )
                .into());
            };

            debug!(?event, "runtime received event");
            let step = self.core.step(event);
            keep_running = self.execute(step);
        }

        if let Some(t) = &ticker {
            t.abort();
        }

        let report = self.core.into_report(started.elapsed());
        info!(
            generated = report.generated.len(),
            failed = report.failed.len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "runtime exiting"
        );
        Ok(report)
    }

    /// Execute the commands from one core step; returns whether to keep going.
    fn execute(&self, step: CoreStep) -> bool {
        for command in step.commands {
            match command {
                CoreCommand::Dispatch(packages) => {
                    for package in packages {
                        self.spawn_build(package);
                    }
                }
                CoreCommand::ReportProgress(progress) => log_progress(&progress),
            }
        }
        step.keep_running
    }

    fn spawn_build(&self, package: ScheduledPackage) {
        let executor = Arc::clone(&self.executor);
        let context = Arc::clone(&self.context);
        let tx = self.event_tx.clone();

        info!(
            package = %package.name,
            kind = %package.kind,
            priority = package.priority,
            "dispatching build"
        );

        tokio::spawn(async move {
            let name = package.name.clone();
            let started = Instant::now();

            // Run the build on its own task so a panicking executor still
            // yields a completion event.
            let build = tokio::spawn(async move { executor.build(&package, &context).await });
            let outcome = match build.await {
                Ok(result) => BuildOutcome::from(result),
                Err(join_err) => BuildOutcome::Failed(BuildError::new(format!(
                    "build task for '{name}' did not complete: {join_err}"
                ))),
            };

            let event = RuntimeEvent::BuildCompleted {
                package: name.clone(),
                outcome,
                elapsed: started.elapsed(),
            };
            if tx.send(event).await.is_err() {
                debug!(package = %name, "runtime gone before build completion was delivered");
            }
        });
    }
}

/// Emit `ProgressTick` every `period` until aborted.
fn spawn_ticker(tx: mpsc::Sender<RuntimeEvent>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        loop {
            interval.tick().await;
            if tx.send(RuntimeEvent::ProgressTick).await.is_err() {
                break;
            }
        }
    })
}

fn log_progress(progress: &Progress) {
    if progress.in_flight.is_empty() && progress.awaiting.is_empty() {
        return;
    }
    info!(
        in_flight = ?progress.in_flight,
        awaiting = ?progress.awaiting,
        succeeded = progress.succeeded,
        failed = progress.failed,
        "build in progress"
    );
    if progress.in_flight.is_empty() {
        warn!(awaiting = progress.awaiting.len(), "no builds in flight while packages await");
    }
}

/// Sort, schedule and build every package in `graph` with `executor`.
///
/// Fails before any dispatch if the graph has a cycle. Build failures do not
/// fail the call; they are reported in the returned [`BuildReport`].
pub async fn build_all<E: BuildExecutor>(
    graph: &DependencyGraph,
    executor: E,
    context: RunContext,
) -> Result<BuildReport> {
    let batches = topological_batches(graph)?;
    let scheduler = Scheduler::new(graph, context.concurrency);
    let core = CoreRuntime::new(scheduler, batches);
    Runtime::new(core, executor, context).run().await
}
