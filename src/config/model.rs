// src/config/model.rs

use serde::Deserialize;

use crate::types::{PackageName, PackageType};

/// Manifest as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// concurrency = 4
///
/// [build]
/// cmd = "make -C {path}"
///
/// [[package]]
/// name = "core"
/// type = "unlocked"
/// path = "packages/core"
///
/// [[package]]
/// name = "app"
/// type = "source"
/// path = "packages/app"
/// dependencies = ["core"]
/// ```
///
/// Packages are an array of tables so declaration order survives
/// deserialization; that order is the tie-break for batching and priority.
#[derive(Debug, Clone, Deserialize)]
pub struct RawManifest {
    /// Run behaviour from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// Build command templates from `[build]`.
    #[serde(default)]
    pub build: BuildSection,

    /// All packages from `[[package]]`, in declaration order.
    #[serde(default)]
    pub package: Vec<RawPackage>,
}

impl RawManifest {
    pub fn find(&self, name: &str) -> Option<&RawPackage> {
        self.package.iter().find(|p| p.name == name)
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Maximum number of packages building at the same time.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Seconds between progress reports while builds are in flight.
    /// `0` disables periodic reporting.
    #[serde(default = "default_progress_interval_secs")]
    pub progress_interval_secs: u64,
}

fn default_concurrency() -> usize {
    4
}

fn default_progress_interval_secs() -> u64 {
    60
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            progress_interval_secs: default_progress_interval_secs(),
        }
    }
}

/// `[build]` section.
///
/// Command templates may use `{name}`, `{type}` and `{path}` placeholders.
/// A per-type template overrides `cmd` for packages of that type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildSection {
    #[serde(default)]
    pub cmd: Option<String>,

    #[serde(default)]
    pub unlocked: Option<String>,

    #[serde(default)]
    pub source: Option<String>,

    #[serde(default)]
    pub data: Option<String>,

    /// Upper bound on a single package build, in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl BuildSection {
    /// Effective command template for a package type.
    pub fn command_for(&self, kind: PackageType) -> Option<&str> {
        let specific = match kind {
            PackageType::Unlocked => self.unlocked.as_deref(),
            PackageType::Source => self.source.as_deref(),
            PackageType::Data => self.data.as_deref(),
        };
        specific.or(self.cmd.as_deref())
    }
}

/// `[[package]]` entry as written in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawPackage {
    pub name: PackageName,

    /// Package type as written; validated into [`PackageType`].
    #[serde(rename = "type")]
    pub kind: String,

    /// Source sub-directory, relative to the project root.
    /// Defaults to the package name.
    #[serde(default)]
    pub path: Option<String>,

    /// Names of packages this package depends on.
    #[serde(default)]
    pub dependencies: Vec<PackageName>,
}

impl RawPackage {
    pub fn effective_path(&self) -> &str {
        self.path.as_deref().unwrap_or(&self.name)
    }
}

/// A validated package declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    pub name: PackageName,
    pub kind: PackageType,
    pub path: String,
    pub dependencies: Vec<PackageName>,
}

impl PackageSpec {
    /// Whether a (possibly older) raw manifest entry describes the same
    /// package as this one.
    pub fn matches_raw(&self, raw: &RawPackage) -> bool {
        let same_kind = raw
            .kind
            .parse::<PackageType>()
            .map(|k| k == self.kind)
            .unwrap_or(false);

        same_kind
            && raw.effective_path().trim_end_matches('/') == self.path.trim_end_matches('/')
            && raw.dependencies == self.dependencies
    }
}

/// Validated manifest.
///
/// Only constructible through `TryFrom<RawManifest>` (see `validate.rs`),
/// so holders can rely on: unique names, known types, resolvable
/// dependencies and an acyclic graph.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub config: ConfigSection,
    pub build: BuildSection,
    packages: Vec<PackageSpec>,
}

impl Manifest {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        build: BuildSection,
        packages: Vec<PackageSpec>,
    ) -> Self {
        Self {
            config,
            build,
            packages,
        }
    }

    /// Packages in declaration order.
    pub fn packages(&self) -> &[PackageSpec] {
        &self.packages
    }

    pub fn package(&self, name: &str) -> Option<&PackageSpec> {
        self.packages.iter().find(|p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.package(name).is_some()
    }

    /// Position of a package in declaration order.
    pub fn order_of(&self, name: &str) -> Option<usize> {
        self.packages.iter().position(|p| p.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.packages.iter().map(|p| p.name.as_str())
    }
}
