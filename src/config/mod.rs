// src/config/mod.rs

//! Manifest loading and validation for builddag.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a manifest from disk (`loader.rs`).
//! - Validate configuration invariants: package types, dependency
//!   references and acyclicity (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_manifest_path, load_and_validate, load_from_path, parse_raw};
pub use model::{
    BuildSection, ConfigSection, Manifest, PackageSpec, RawManifest, RawPackage,
};
