// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `builddag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "builddag",
    version,
    about = "Build monorepo packages in dependency order, in parallel.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the package manifest (TOML).
    #[arg(long, value_name = "PATH", default_value = "Builddag.toml")]
    pub manifest: String,

    /// Maximum number of packages building at once (overrides `[config].concurrency`).
    #[arg(short = 'j', long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub concurrency: Option<u64>,

    /// Only build packages changed since their last build marker.
    #[arg(long)]
    pub diff: bool,

    /// TOML file overriding build markers per package (`[markers] name = "rev"`).
    #[arg(long, value_name = "PATH", requires = "diff")]
    pub markers: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BUILDDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate, select and print the build batches without building anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
