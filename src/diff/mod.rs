// src/diff/mod.rs

//! Change selection for incremental ("diff") runs.
//!
//! - [`source_control`] abstracts the repository queries (`GitCli` in
//!   production).
//! - [`markers`] resolves each package's last-known build revision from an
//!   override file or version tags.
//! - [`selector`] narrows the manifest to packages changed since their marker,
//!   before the dependency graph is built.

pub mod markers;
pub mod selector;
pub mod source_control;

pub use markers::{latest_version_tag, MarkerStore};
pub use selector::{ChangeSelector, Selection, SelectionReason};
pub use source_control::{GitCli, ScmFuture, SourceControl};
