// tests/config_validation.rs

use std::io::Write;

use tempfile::NamedTempFile;

use builddag::config::{load_and_validate, parse_raw, Manifest};
use builddag::errors::BuilddagError;
use builddag::types::PackageType;
use builddag_test_utils::builders::{ManifestBuilder, PackageBuilder};

fn write_manifest(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn loads_packages_in_declaration_order() {
    let file = write_manifest(
        r#"
[config]
concurrency = 2

[build]
cmd = "make -C {path}"

[[package]]
name = "zeta"
type = "unlocked"
path = "packages/zeta/"

[[package]]
name = "alpha"
type = "Source"
dependencies = ["zeta"]
"#,
    );

    let manifest = load_and_validate(file.path()).unwrap();
    let names: Vec<&str> = manifest.names().collect();
    assert_eq!(names, vec!["zeta", "alpha"]);

    assert_eq!(manifest.config.concurrency, 2);
    assert_eq!(manifest.build.cmd.as_deref(), Some("make -C {path}"));

    let zeta = manifest.package("zeta").unwrap();
    assert_eq!(zeta.kind, PackageType::Unlocked);
    assert_eq!(zeta.path, "packages/zeta");

    let alpha = manifest.package("alpha").unwrap();
    assert_eq!(alpha.kind, PackageType::Source);
    assert_eq!(alpha.path, "alpha", "path defaults to the package name");
    assert_eq!(alpha.dependencies, vec!["zeta".to_string()]);
    assert_eq!(manifest.order_of("alpha"), Some(1));
}

#[test]
fn config_section_defaults_apply() {
    let raw = parse_raw(
        r#"
[[package]]
name = "core"
type = "data"
"#,
    )
    .unwrap();

    assert_eq!(raw.config.concurrency, 4);
    assert_eq!(raw.config.progress_interval_secs, 60);
    assert!(raw.build.cmd.is_none());
}

#[test]
fn dag_cycle_returns_structured_error() {
    let file = write_manifest(
        r#"
[[package]]
name = "A"
type = "unlocked"
dependencies = ["C"]

[[package]]
name = "B"
type = "unlocked"
dependencies = ["A"]

[[package]]
name = "C"
type = "source"
dependencies = ["B"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(BuilddagError::DagCycle(msg)) => {
            assert!(msg.contains("cycle detected"));
            assert!(msg.contains('A') || msg.contains('B') || msg.contains('C'));
        }
        Err(e) => panic!("Expected DagCycle error, got: {e:?}"),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn unknown_dependency_names_both_packages() {
    let file = write_manifest(
        r#"
[[package]]
name = "app"
type = "source"
dependencies = ["missing"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(BuilddagError::UnknownDependency {
            package,
            dependency,
        }) => {
            assert_eq!(package, "app");
            assert_eq!(dependency, "missing");
        }
        other => panic!("Expected UnknownDependency error, got: {other:?}"),
    }
}

#[test]
fn unknown_package_type_is_rejected() {
    let raw = ManifestBuilder::new()
        .with_package(PackageBuilder::new("core", "managed").build())
        .build_raw();

    match Manifest::try_from(raw) {
        Err(BuilddagError::UnknownPackageType { package, value }) => {
            assert_eq!(package, "core");
            assert_eq!(value, "managed");
        }
        other => panic!("Expected UnknownPackageType error, got: {other:?}"),
    }
}

#[test]
fn duplicate_package_names_are_rejected() {
    let raw = ManifestBuilder::new()
        .unlocked("core", &[])
        .source("core", &[])
        .build_raw();

    let err = Manifest::try_from(raw).unwrap_err();
    assert!(matches!(err, BuilddagError::ConfigError(ref m) if m.contains("more than once")));
    assert!(err.is_configuration());
}

#[test]
fn self_dependency_is_rejected() {
    let raw = ManifestBuilder::new().unlocked("core", &["core"]).build_raw();
    let err = Manifest::try_from(raw).unwrap_err();
    assert!(matches!(err, BuilddagError::ConfigError(ref m) if m.contains("itself")));
}

#[test]
fn zero_concurrency_is_rejected() {
    let raw = ManifestBuilder::new()
        .unlocked("core", &[])
        .concurrency(0)
        .build_raw();

    let err = Manifest::try_from(raw).unwrap_err();
    assert!(matches!(err, BuilddagError::ConfigError(ref m) if m.contains("concurrency")));
}

#[test]
fn empty_manifest_is_rejected() {
    let raw = ManifestBuilder::new().build_raw();
    assert!(matches!(
        Manifest::try_from(raw),
        Err(BuilddagError::ConfigError(_))
    ));
}

#[test]
fn malformed_toml_surfaces_parse_error() {
    let file = write_manifest("[[package]\nname = ");
    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, BuilddagError::TomlError(_)));
}

#[test]
fn missing_manifest_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_and_validate(dir.path().join("Builddag.toml")).unwrap_err();
    assert!(matches!(err, BuilddagError::IoError(_)));
    assert!(!err.is_configuration());
}
