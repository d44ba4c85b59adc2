use std::fmt;
use std::str::FromStr;

/// Canonical package name type used throughout the crate.
pub type PackageName = String;

/// Kind of package declared in the manifest.
///
/// - `Unlocked`: versioned package, typically depended upon by others.
/// - `Source`: plain source deployment unit.
/// - `Data`: data-only unit (seed records, fixtures).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageType {
    Unlocked,
    Source,
    Data,
}

/// Priority given to source and data packages, regardless of their dependents.
pub const FIXED_MIDDLE_PRIORITY: u32 = 50;

/// Base priority for unlocked packages that have dependents.
const UNLOCKED_WITH_DEPENDENTS_BASE: u32 = 100;

impl PackageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageType::Unlocked => "unlocked",
            PackageType::Source => "source",
            PackageType::Data => "data",
        }
    }

    /// Scheduling priority among ready packages; higher goes first.
    ///
    /// Only affects queueing order, never dependency ordering.
    pub fn priority(&self, dependent_count: usize) -> u32 {
        match self {
            PackageType::Unlocked if dependent_count > 0 => {
                UNLOCKED_WITH_DEPENDENTS_BASE.saturating_add(dependent_count as u32)
            }
            PackageType::Unlocked => 0,
            PackageType::Source | PackageType::Data => FIXED_MIDDLE_PRIORITY,
        }
    }

    /// Whether a change to the package's manifest entry alone warrants a
    /// rebuild in diff runs.
    pub fn rebuilds_on_manifest_change(&self) -> bool {
        match self {
            PackageType::Unlocked | PackageType::Source => true,
            PackageType::Data => false,
        }
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unlocked" => Ok(PackageType::Unlocked),
            "source" => Ok(PackageType::Source),
            "data" => Ok(PackageType::Data),
            other => Err(format!(
                "invalid package type: {other} (expected \"unlocked\", \"source\" or \"data\")"
            )),
        }
    }
}
