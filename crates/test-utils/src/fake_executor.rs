use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use builddag::context::RunContext;
use builddag::dag::ScheduledPackage;
use builddag::exec::{BuildArtifact, BuildError, BuildExecutor, BuildFuture};

/// Everything a [`ScriptedExecutor`] observed during a run.
#[derive(Debug, Default)]
pub struct ExecutionLog {
    /// Packages in the order they were handed to the executor.
    pub started: Vec<String>,
    /// Packages in the order their builds finished.
    pub finished: Vec<String>,
    /// For each started package, the packages finished at that moment.
    pub finished_before_start: HashMap<String, HashSet<String>>,
    pub in_flight: usize,
    pub max_in_flight: usize,
}

/// A fake executor that:
/// - records start/finish order and concurrent in-flight builds
/// - fails the packages it was told to fail
/// - optionally sleeps per package so builds overlap.
#[derive(Clone)]
pub struct ScriptedExecutor {
    log: Arc<Mutex<ExecutionLog>>,
    failing: Arc<HashSet<String>>,
    panicking: Arc<HashSet<String>>,
    delays: Arc<HashMap<String, Duration>>,
    default_delay: Duration,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(ExecutionLog::default())),
            failing: Arc::new(HashSet::new()),
            panicking: Arc::new(HashSet::new()),
            delays: Arc::new(HashMap::new()),
            default_delay: Duration::ZERO,
        }
    }

    pub fn failing(mut self, packages: &[&str]) -> Self {
        self.failing = Arc::new(packages.iter().map(|p| p.to_string()).collect());
        self
    }

    pub fn panicking(mut self, packages: &[&str]) -> Self {
        self.panicking = Arc::new(packages.iter().map(|p| p.to_string()).collect());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    pub fn with_delay_for(mut self, package: &str, delay: Duration) -> Self {
        let mut delays = (*self.delays).clone();
        delays.insert(package.to_string(), delay);
        self.delays = Arc::new(delays);
        self
    }

    /// Shared handle to the log; clone before moving the executor into a run.
    pub fn log(&self) -> Arc<Mutex<ExecutionLog>> {
        Arc::clone(&self.log)
    }
}

impl Default for ScriptedExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildExecutor for ScriptedExecutor {
    fn build<'a>(
        &'a self,
        package: &'a ScheduledPackage,
        _context: &'a RunContext,
    ) -> BuildFuture<'a> {
        Box::pin(async move {
            let name = package.name.clone();
            {
                let mut log = self.log.lock().unwrap();
                let done: HashSet<String> = log.finished.iter().cloned().collect();
                log.finished_before_start.insert(name.clone(), done);
                log.started.push(name.clone());
                log.in_flight += 1;
                log.max_in_flight = log.max_in_flight.max(log.in_flight);
            }

            let delay = self.delays.get(&name).copied().unwrap_or(self.default_delay);
            if delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(delay).await;
            }

            {
                let mut log = self.log.lock().unwrap();
                log.in_flight -= 1;
                log.finished.push(name.clone());
            }

            if self.panicking.contains(&name) {
                panic!("scripted panic while building {name}");
            }

            if self.failing.contains(&name) {
                Err(BuildError::new(format!("scripted failure for {name}")))
            } else {
                Ok(BuildArtifact::new(format!("{name}@1.0.0")))
            }
        })
    }
}
