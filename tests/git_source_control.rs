// tests/git_source_control.rs

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use builddag::config::load_and_validate;
use builddag::diff::{ChangeSelector, GitCli, MarkerStore, SourceControl};
use builddag::errors::BuilddagError;
use builddag_test_utils::{init_tracing, with_timeout};

const MANIFEST: &str = r#"
[[package]]
name = "a"
type = "unlocked"
path = "packages/a"

[[package]]
name = "b"
type = "source"
path = "packages/b"
dependencies = ["a"]
"#;

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(["-c", "commit.gpgsign=false", "-c", "tag.gpgsign=false"])
        .args(args)
        .current_dir(dir)
        .env("GIT_AUTHOR_NAME", "builddag")
        .env("GIT_AUTHOR_EMAIL", "builddag@example.com")
        .env("GIT_COMMITTER_NAME", "builddag")
        .env("GIT_COMMITTER_EMAIL", "builddag@example.com")
        .output()
        .expect("git must be installed to run these tests");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn write(path: PathBuf, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// Repository with the project in `mono/`:
/// - commit 1 tagged `a_v1.0.0` and `b_v1.0.0`
/// - commit 2 (HEAD) changes `mono/packages/b` and a file outside the
///   project, and is tagged `a_v1.0.1`
/// - an unmerged side branch carries `a_v9.0.0`
struct Repo {
    _dir: TempDir,
    root: PathBuf,
    project: PathBuf,
}

impl Repo {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let project = root.join("mono");

        git(&root, &["init", "-q"]);
        write(project.join("Builddag.toml"), MANIFEST);
        write(project.join("packages/a/lib.txt"), "a1");
        write(project.join("packages/b/lib.txt"), "b1");
        write(root.join("README.md"), "readme");
        git(&root, &["add", "-A"]);
        git(&root, &["commit", "-q", "-m", "initial"]);
        git(&root, &["tag", "a_v1.0.0"]);
        git(&root, &["tag", "b_v1.0.0"]);

        write(project.join("packages/b/lib.txt"), "b2");
        write(root.join("README.md"), "readme, revised");
        git(&root, &["commit", "-q", "-am", "change b"]);
        git(&root, &["tag", "a_v1.0.1"]);

        let branch = git(&root, &["rev-parse", "--abbrev-ref", "HEAD"]);
        git(&root, &["checkout", "-q", "-b", "side"]);
        git(&root, &["commit", "-q", "--allow-empty", "-m", "side work"]);
        git(&root, &["tag", "a_v9.0.0"]);
        git(&root, &["checkout", "-q", &branch]);

        Self {
            _dir: dir,
            root,
            project,
        }
    }
}

#[tokio::test]
async fn head_matches_rev_parse() {
    let repo = Repo::new();
    let scm = GitCli::new(&repo.project);

    let head = with_timeout(scm.head()).await.unwrap();
    assert_eq!(head, git(&repo.root, &["rev-parse", "HEAD"]));
}

#[tokio::test]
async fn tags_are_limited_to_prefix_and_merged_history() {
    let repo = Repo::new();
    let scm = GitCli::new(&repo.project);

    let tags = with_timeout(scm.list_tags("a_v")).await.unwrap();
    assert_eq!(tags, vec!["a_v1.0.0".to_string(), "a_v1.0.1".to_string()]);
}

#[tokio::test]
async fn changed_paths_are_relative_to_the_project_directory() {
    let repo = Repo::new();
    let scm = GitCli::new(&repo.project);

    let head = scm.head().await.unwrap();
    let changed = with_timeout(scm.changed_paths("b_v1.0.0", &head)).await.unwrap();
    assert_eq!(changed, vec!["packages/b/lib.txt".to_string()]);
}

#[tokio::test]
async fn file_at_reads_old_revisions_and_reports_missing_files() {
    let repo = Repo::new();
    let scm = GitCli::new(&repo.project);

    let manifest = with_timeout(scm.file_at("b_v1.0.0", "Builddag.toml")).await.unwrap();
    assert!(manifest.is_some_and(|m| m.contains("name = \"b\"")));

    let missing = scm.file_at("b_v1.0.0", "packages/c/lib.txt").await.unwrap();
    assert_eq!(missing, None);
}

#[tokio::test]
async fn unknown_revision_is_a_source_control_error() {
    let repo = Repo::new();
    let scm = GitCli::new(&repo.project);

    let err = scm.file_at("no_such_marker", "Builddag.toml").await.unwrap_err();
    assert!(matches!(err, BuilddagError::SourceControl(_)));

    let head = scm.head().await.unwrap();
    let err = scm.changed_paths("no_such_marker", &head).await.unwrap_err();
    assert!(matches!(err, BuilddagError::SourceControl(ref m) if m.contains("no_such_marker")));
}

#[tokio::test]
async fn selector_over_real_history_picks_changed_package() {
    init_tracing();
    let repo = Repo::new();
    let manifest = load_and_validate(repo.project.join("Builddag.toml")).unwrap();
    let scm = GitCli::new(&repo.project);
    let markers = MarkerStore::new();
    let selector = ChangeSelector::new(&scm, &markers, "Builddag.toml");

    let selected = with_timeout(selector.select(&manifest)).await.unwrap();
    assert_eq!(selected, vec!["b".to_string()]);
}

#[tokio::test]
async fn unknown_override_marker_aborts_selection() {
    let repo = Repo::new();
    let manifest = load_and_validate(repo.project.join("Builddag.toml")).unwrap();
    let scm = GitCli::new(&repo.project);
    let unknown = "0".repeat(40);
    let markers = MarkerStore::parse(&format!("[markers]\na = \"{unknown}\"\n")).unwrap();
    let selector = ChangeSelector::new(&scm, &markers, "Builddag.toml");

    let err = with_timeout(selector.select(&manifest)).await.unwrap_err();
    assert!(matches!(err, BuilddagError::SourceControl(_)));
}
