// src/exec/mod.rs

//! Build execution layer.
//!
//! - [`backend`] defines the `BuildExecutor` trait the runtime calls for each
//!   dispatched package, plus the artifact/error types it returns.
//! - [`command`] provides `CommandExecutor`, which runs the manifest's build
//!   command templates with `tokio::process::Command`.

pub mod backend;
pub mod command;

pub use backend::{BuildArtifact, BuildError, BuildExecutor, BuildFuture};
pub use command::{render_command, CommandExecutor};
