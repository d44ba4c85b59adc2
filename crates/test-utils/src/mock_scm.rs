use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use builddag::diff::{ScmFuture, SourceControl};
use builddag::errors::BuilddagError;

/// In-memory [`SourceControl`] for change-selector tests.
#[derive(Debug, Clone, Default)]
pub struct MockSourceControl {
    head: String,
    tags: Vec<String>,
    /// `from` revision -> paths changed between it and HEAD.
    diffs: HashMap<String, Vec<String>>,
    /// (revision, path) -> file contents.
    files: HashMap<(String, String), String>,
    fail_diffs: bool,
    queries: Arc<Mutex<Vec<String>>>,
}

impl MockSourceControl {
    pub fn new(head: &str) -> Self {
        Self {
            head: head.to_string(),
            ..Self::default()
        }
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }

    pub fn with_diff(mut self, from: &str, paths: &[&str]) -> Self {
        self.diffs
            .insert(from.to_string(), paths.iter().map(|p| p.to_string()).collect());
        self
    }

    pub fn with_file(mut self, revision: &str, path: &str, contents: &str) -> Self {
        self.files
            .insert((revision.to_string(), path.to_string()), contents.to_string());
        self
    }

    /// Make every `changed_paths` query fail.
    pub fn failing_diffs(mut self) -> Self {
        self.fail_diffs = true;
        self
    }

    /// Queries issued so far, e.g. `"diff tag..head"`.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    fn record(&self, query: String) {
        self.queries.lock().unwrap().push(query);
    }
}

impl SourceControl for MockSourceControl {
    fn head(&self) -> ScmFuture<'_, String> {
        Box::pin(async move { Ok(self.head.clone()) })
    }

    fn changed_paths<'a>(&'a self, from: &'a str, to: &'a str) -> ScmFuture<'a, Vec<String>> {
        Box::pin(async move {
            self.record(format!("diff {from}..{to}"));
            if self.fail_diffs {
                return Err(BuilddagError::SourceControl(format!(
                    "unknown revision '{from}'"
                )));
            }
            Ok(self.diffs.get(from).cloned().unwrap_or_default())
        })
    }

    fn list_tags<'a>(&'a self, prefix: &'a str) -> ScmFuture<'a, Vec<String>> {
        Box::pin(async move {
            Ok(self
                .tags
                .iter()
                .filter(|t| t.starts_with(prefix))
                .cloned()
                .collect())
        })
    }

    fn file_at<'a>(&'a self, revision: &'a str, path: &'a str) -> ScmFuture<'a, Option<String>> {
        Box::pin(async move {
            self.record(format!("show {revision}:{path}"));
            Ok(self
                .files
                .get(&(revision.to_string(), path.to_string()))
                .cloned())
        })
    }
}
