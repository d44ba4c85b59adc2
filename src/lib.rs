// src/lib.rs

pub mod cli;
pub mod config;
pub mod context;
pub mod dag;
pub mod diff;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod report;
pub mod types;

use std::path::PathBuf;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::Manifest;
use crate::context::RunContext;
use crate::dag::{topological_batches, DependencyGraph, Scheduler};
use crate::diff::{ChangeSelector, GitCli, MarkerStore};
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent};
use crate::errors::Result;
use crate::exec::CommandExecutor;
use crate::report::BuildReport;
use crate::types::PackageName;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - manifest loading and validation
/// - optional change selection (`--diff`)
/// - dependency graph + batching
/// - scheduler / runtime with the command executor
/// - Ctrl-C handling
///
/// Returns the run's report; a dry run returns an empty one.
pub async fn run(args: CliArgs) -> Result<BuildReport> {
    let manifest_path = PathBuf::from(&args.manifest);
    let manifest = load_and_validate(&manifest_path)?;

    let concurrency = args.concurrency.map(|n| n as usize);
    let context = RunContext::from_manifest(&manifest, &manifest_path, concurrency);

    let selected = select_packages(&args, &manifest, &context).await?;
    let graph = DependencyGraph::build(&selected, &manifest)?;
    let batches = topological_batches(&graph)?;

    if args.dry_run {
        print_dry_run(&graph, &batches, &context);
        return Ok(BuildReport::default());
    }

    let scheduler = Scheduler::new(&graph, context.concurrency);
    let core = CoreRuntime::new(scheduler, batches);
    let runtime = Runtime::new(core, CommandExecutor::new(), context);

    // Ctrl-C → stop dispatching, drain in-flight builds.
    {
        let tx = runtime.event_sender();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let report = runtime.run().await?;
    print_summary(&report);
    Ok(report)
}

/// Full manifest, or only changed packages in `--diff` mode.
async fn select_packages(
    args: &CliArgs,
    manifest: &Manifest,
    context: &RunContext,
) -> Result<Vec<PackageName>> {
    if !args.diff {
        return Ok(manifest.names().map(str::to_string).collect());
    }

    let markers = match args.markers.as_deref() {
        Some(path) => MarkerStore::load(path)?,
        None => MarkerStore::new(),
    };
    let git = GitCli::new(context.project_root.clone());
    let selector = ChangeSelector::new(&git, &markers, &context.manifest_file);

    let selected = selector.select(manifest).await?;
    info!(
        selected = selected.len(),
        total = manifest.packages().len(),
        packages = ?selected,
        "diff run: packages selected"
    );
    Ok(selected)
}

/// Dry-run output: print batches and package details.
fn print_dry_run(graph: &DependencyGraph, batches: &[Vec<PackageName>], context: &RunContext) {
    println!("builddag dry-run");
    println!("  concurrency = {}", context.concurrency);
    println!("  packages = {}", graph.len());
    println!();

    for (i, batch) in batches.iter().enumerate() {
        println!("batch {i}:");
        for name in batch {
            let Some(spec) = graph.spec(name) else {
                continue;
            };
            println!("  - {name} ({}, {})", spec.kind, spec.path);
            let parents = graph.parents_of(name);
            if !parents.is_empty() {
                println!("      after: {:?}", parents);
            }
        }
    }

    debug!("dry-run complete (no builds)");
}

fn print_summary(report: &BuildReport) {
    println!();
    println!(
        "builddag: {} package(s) built, {} failed in {:.1}s",
        report.generated.len(),
        report.failed.len(),
        report.elapsed.as_secs_f64()
    );
    for result in report.generated.iter() {
        let descriptor = result.artifact.descriptor.as_deref().unwrap_or("-");
        println!(
            "  ok     {} ({:.1}s) {}",
            result.name,
            result.elapsed.as_secs_f64(),
            descriptor
        );
    }
    for failed in report.failed.iter() {
        println!("  failed {} ({})", failed.name, failed.reason);
    }
}
