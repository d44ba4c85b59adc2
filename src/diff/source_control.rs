// src/diff/source_control.rs

//! Source-control access needed by the change selector.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::errors::{BuilddagError, Result};

/// Boxed future returned by [`SourceControl`] methods.
pub type ScmFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Read-only queries against the repository.
///
/// Every failure must surface as [`BuilddagError::SourceControl`]; the
/// selector never guesses a package set after a failed query.
pub trait SourceControl: Send + Sync {
    /// Revision the working copy is at.
    fn head(&self) -> ScmFuture<'_, String>;

    /// Paths changed between `from` and `to`, relative to the project root.
    fn changed_paths<'a>(&'a self, from: &'a str, to: &'a str) -> ScmFuture<'a, Vec<String>>;

    /// Tags starting with `prefix`.
    fn list_tags<'a>(&'a self, prefix: &'a str) -> ScmFuture<'a, Vec<String>>;

    /// Contents of `path` (relative to the project root) at `revision`, or
    /// `None` if it did not exist there.
    fn file_at<'a>(&'a self, revision: &'a str, path: &'a str) -> ScmFuture<'a, Option<String>>;
}

/// [`SourceControl`] backed by the `git` command line.
///
/// Runs in the project root, which may be a sub-directory of the repository.
#[derive(Debug, Clone)]
pub struct GitCli {
    repo_dir: PathBuf,
}

impl GitCli {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
        }
    }

    async fn git(&self, args: &[&str]) -> Result<GitOutput> {
        debug!(?args, dir = ?self.repo_dir, "running git");

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_dir)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                BuilddagError::SourceControl(format!("failed to run git {}: {e}", args.join(" ")))
            })?;

        Ok(GitOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    async fn git_checked(&self, args: &[&str]) -> Result<String> {
        let out = self.git(args).await?;
        if !out.success {
            return Err(BuilddagError::SourceControl(format!(
                "git {} failed: {}",
                args.join(" "),
                out.stderr
            )));
        }
        Ok(out.stdout)
    }
}

struct GitOutput {
    success: bool,
    stdout: String,
    stderr: String,
}

fn non_empty_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

impl SourceControl for GitCli {
    fn head(&self) -> ScmFuture<'_, String> {
        Box::pin(async move {
            let out = self.git_checked(&["rev-parse", "HEAD"]).await?;
            Ok(out.trim().to_string())
        })
    }

    fn changed_paths<'a>(&'a self, from: &'a str, to: &'a str) -> ScmFuture<'a, Vec<String>> {
        Box::pin(async move {
            let range = format!("{from}..{to}");
            let out = self
                .git_checked(&["diff", "--name-only", "--no-renames", "--relative", &range])
                .await?;
            Ok(non_empty_lines(&out))
        })
    }

    fn list_tags<'a>(&'a self, prefix: &'a str) -> ScmFuture<'a, Vec<String>> {
        Box::pin(async move {
            let pattern = format!("{prefix}*");
            let out = self
                .git_checked(&["tag", "--list", &pattern, "--merged", "HEAD"])
                .await?;
            Ok(non_empty_lines(&out))
        })
    }

    fn file_at<'a>(&'a self, revision: &'a str, path: &'a str) -> ScmFuture<'a, Option<String>> {
        Box::pin(async move {
            // Resolve the revision first so a bad marker is an error, not a
            // silently missing file.
            let commit = format!("{revision}^{{commit}}");
            self.git_checked(&["rev-parse", "--verify", "--quiet", &commit])
                .await?;

            let spec = format!("{revision}:./{path}");
            let out = self.git(&["show", &spec]).await?;
            if out.success {
                Ok(Some(out.stdout))
            } else {
                debug!(revision, path, stderr = %out.stderr, "file not present at revision");
                Ok(None)
            }
        })
    }
}
