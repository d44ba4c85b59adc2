#![allow(dead_code)]

use builddag::config::{BuildSection, ConfigSection, Manifest, RawManifest, RawPackage};
use builddag::dag::DependencyGraph;

/// Builder for `Manifest` to simplify test setup.
pub struct ManifestBuilder {
    manifest: RawManifest,
}

impl ManifestBuilder {
    pub fn new() -> Self {
        Self {
            manifest: RawManifest {
                config: ConfigSection::default(),
                build: BuildSection::default(),
                package: Vec::new(),
            },
        }
    }

    pub fn with_package(mut self, package: RawPackage) -> Self {
        self.manifest.package.push(package);
        self
    }

    /// Shorthand for an unlocked package at `packages/<name>`.
    pub fn unlocked(self, name: &str, deps: &[&str]) -> Self {
        self.with_package(PackageBuilder::unlocked(name).after_all(deps).build())
    }

    pub fn source(self, name: &str, deps: &[&str]) -> Self {
        self.with_package(PackageBuilder::source(name).after_all(deps).build())
    }

    pub fn data(self, name: &str, deps: &[&str]) -> Self {
        self.with_package(PackageBuilder::data(name).after_all(deps).build())
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.manifest.config.concurrency = n;
        self
    }

    pub fn build_cmd(mut self, cmd: &str) -> Self {
        self.manifest.build.cmd = Some(cmd.to_string());
        self
    }

    pub fn build_raw(self) -> RawManifest {
        self.manifest
    }

    pub fn build(self) -> Manifest {
        Manifest::try_from(self.manifest).expect("Failed to build valid manifest from builder")
    }

    /// Validated manifest plus the graph over all of its packages.
    pub fn build_graph(self) -> (Manifest, DependencyGraph) {
        let manifest = self.build();
        let names: Vec<String> = manifest.names().map(str::to_string).collect();
        let graph = DependencyGraph::build(&names, &manifest).expect("graph over full manifest");
        (manifest, graph)
    }
}

impl Default for ManifestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `RawPackage`.
pub struct PackageBuilder {
    package: RawPackage,
}

impl PackageBuilder {
    pub fn new(name: &str, kind: &str) -> Self {
        Self {
            package: RawPackage {
                name: name.to_string(),
                kind: kind.to_string(),
                path: Some(format!("packages/{name}")),
                dependencies: vec![],
            },
        }
    }

    pub fn unlocked(name: &str) -> Self {
        Self::new(name, "unlocked")
    }

    pub fn source(name: &str) -> Self {
        Self::new(name, "source")
    }

    pub fn data(name: &str) -> Self {
        Self::new(name, "data")
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.package.dependencies.push(dep.to_string());
        self
    }

    pub fn after_all(mut self, deps: &[&str]) -> Self {
        self.package
            .dependencies
            .extend(deps.iter().map(|d| d.to_string()));
        self
    }

    pub fn path(mut self, path: &str) -> Self {
        self.package.path = Some(path.to_string());
        self
    }

    pub fn build(self) -> RawPackage {
        self.package
    }
}
