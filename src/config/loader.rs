// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{Manifest, RawManifest};
use crate::errors::Result;

/// Load a manifest from a given path and return the raw `RawManifest`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (types, dependencies, cycles). Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawManifest> {
    let contents = fs::read_to_string(path.as_ref())?;
    parse_raw(&contents)
}

/// Parse manifest text without validating it.
///
/// Used directly by the change selector to read the manifest as it was at an
/// older revision.
pub fn parse_raw(contents: &str) -> Result<RawManifest> {
    let manifest: RawManifest = toml::from_str(contents)?;
    Ok(manifest)
}

/// Load a manifest from path and validate it.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks for:
///   - duplicate and unknown package types,
///   - unknown or self dependencies,
///   - dependency cycles,
///   - `[config]` sanity.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Manifest> {
    let raw = load_from_path(&path)?;
    Manifest::try_from(raw)
}

/// Default manifest location: `Builddag.toml` in the current working directory.
pub fn default_manifest_path() -> PathBuf {
    PathBuf::from("Builddag.toml")
}
