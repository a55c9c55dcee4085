//! Merging the runner's reported assertions back into a parsed tree.
//!
//! Parameterized tests (`it.each`, template titles, dynamically built names) report
//! titles the source parser could not predict. Every assertion is walked down its
//! ancestor titles; missing describes and tests are synthesized with
//! `runtime_discovered = true` and appended after their existing siblings. Nodes that
//! already exist are left untouched.

use im::Vector;
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::{PathNormalization, Settings};
use crate::err_msg;
use crate::id::contains_delimiter;
use crate::tree::{
    DescribeNode, FileEntry, FileNode, FileWithParseErrorNode, FolderNode, ProjectRootNode,
    TestNode, WorkspaceRootNode,
};
use crate::ScopeError;

// ============================================================================
// RUNNER RESULTS
// ============================================================================

/// Results the runner reported for one source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResults {
    #[serde(alias = "name")]
    pub file: String,
    #[serde(default, alias = "assertionResults")]
    pub assertions: Vec<AssertionResult>,
}

/// One reported test. Outcome fields are carried along without interpretation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionResult {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ancestor_titles: Vec<String>,
    pub title: String,
    #[serde(flatten)]
    pub outcome: serde_json::Map<String, serde_json::Value>,
}

impl AssertionResult {
    pub fn new<I, S>(ancestor_titles: I, title: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ancestor_titles: ancestor_titles.into_iter().map(Into::into).collect(),
            title: title.into(),
            outcome: serde_json::Map::new(),
        }
    }

    /// The runner's full name for this test: ancestors and title joined by spaces.
    pub fn full_name(&self) -> String {
        let mut parts: Vec<&str> = self.ancestor_titles.iter().map(String::as_str).collect();
        parts.push(&self.title);
        parts.join(" ")
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// SUITES
// ============================================================================

/// A node that can hold describes and tests.
trait Suite {
    fn id(&self) -> &str;
    fn describe_blocks_mut(&mut self) -> &mut Vector<DescribeNode>;
    fn tests_mut(&mut self) -> &mut Vector<TestNode>;
}

macro_rules! impl_suite {
    ($($ty:ty),*) => {
        $(impl Suite for $ty {
            fn id(&self) -> &str {
                &self.id
            }
            fn describe_blocks_mut(&mut self) -> &mut Vector<DescribeNode> {
                &mut self.describe_blocks
            }
            fn tests_mut(&mut self) -> &mut Vector<TestNode> {
                &mut self.tests
            }
        })*
    };
}

impl_suite!(FileNode, FileWithParseErrorNode, DescribeNode);

// ============================================================================
// MERGE
// ============================================================================

/// Merges `results` into every matching file of `project`.
///
/// Files without results, and folders containing none of them, are returned as they
/// were. An assertion with an empty ancestor title violates the result contract and
/// aborts the whole merge.
#[tracing::instrument(level = "debug", skip_all, fields(project = %project.id, results = results.len()))]
pub fn merge_runtime_results(
    project: &ProjectRootNode,
    results: &[FileResults],
    settings: &Settings,
) -> Result<ProjectRootNode, ScopeError> {
    let merger = Merger::new(results, settings.path_normalization);
    let files = merger.files(&project.files)?;
    let folders = merger.folders(&project.folders)?;
    if files.is_none() && folders.is_none() {
        tracing::debug!("no file of the project has results");
        return Ok(project.clone());
    }
    Ok(ProjectRootNode {
        files: files.unwrap_or_else(|| project.files.clone()),
        folders: folders.unwrap_or_else(|| project.folders.clone()),
        ..project.clone()
    })
}

/// [`merge_runtime_results`] applied to every project of a workspace.
pub fn merge_workspace_results(
    workspace: &WorkspaceRootNode,
    results: &[FileResults],
    settings: &Settings,
) -> Result<WorkspaceRootNode, ScopeError> {
    let projects = workspace
        .projects
        .iter()
        .map(|p| merge_runtime_results(p, results, settings))
        .collect::<Result<Vector<_>, _>>()?;
    Ok(WorkspaceRootNode {
        projects,
        ..workspace.clone()
    })
}

struct Merger<'a> {
    results: Vec<(String, &'a FileResults)>,
    policy: PathNormalization,
}

impl<'a> Merger<'a> {
    fn new(results: &'a [FileResults], policy: PathNormalization) -> Self {
        Self {
            results: results.iter().map(|r| (policy.normalize(&r.file), r)).collect(),
            policy,
        }
    }

    fn results_for(&self, path: &str) -> Option<&'a FileResults> {
        let path = self.policy.normalize(path);
        self.results
            .iter()
            .find(|(file, _)| *file == path)
            .map(|(_, results)| *results)
    }

    /// `None` when no folder changed.
    fn folders(&self, folders: &Vector<FolderNode>) -> Result<Option<Vector<FolderNode>>, ScopeError> {
        let mut merged = folders.clone();
        let mut changed = false;
        for (index, folder) in folders.iter().enumerate() {
            let files = self.files(&folder.files)?;
            let children = self.folders(&folder.folders)?;
            if files.is_none() && children.is_none() {
                continue;
            }
            let updated = FolderNode {
                files: files.unwrap_or_else(|| folder.files.clone()),
                folders: children.unwrap_or_else(|| folder.folders.clone()),
                ..folder.clone()
            };
            merged.set(index, updated);
            changed = true;
        }
        Ok(changed.then_some(merged))
    }

    /// `None` when no file had results.
    fn files(&self, files: &Vector<FileEntry>) -> Result<Option<Vector<FileEntry>>, ScopeError> {
        let mut merged = files.clone();
        let mut changed = false;
        for (index, entry) in files.iter().enumerate() {
            let Some(results) = self.results_for(entry.file()) else {
                continue;
            };
            let updated = match entry {
                FileEntry::Parsed(file) => FileEntry::Parsed(merge_file(file, results)?),
                FileEntry::ParseError(file) => FileEntry::ParseError(merge_file(file, results)?),
            };
            merged.set(index, updated);
            changed = true;
        }
        Ok(changed.then_some(merged))
    }
}

fn merge_file<F: Suite + Clone>(file: &F, results: &FileResults) -> Result<F, ScopeError> {
    let mut merged = file.clone();
    for assertion in &results.assertions {
        place(&mut merged, &assertion.ancestor_titles, assertion, &results.file)
            .map_err(|e| e.with_context(&results.file))?;
    }
    tracing::trace!(file = %results.file, assertions = results.assertions.len(), "merged file");
    Ok(merged)
}

/// Walks `ancestors` below `suite` and makes sure the assertion's test exists at the end.
fn place<S: Suite>(
    suite: &mut S,
    ancestors: &[String],
    assertion: &AssertionResult,
    file: &str,
) -> Result<(), ScopeError> {
    let Some((title, rest)) = ancestors.split_first() else {
        let tests = suite.tests_mut();
        if !tests.iter().any(|t| t.label == assertion.title) {
            warn_on_delimiter(&assertion.title);
            let parent_id = suite.id().to_string();
            let test = TestNode::runtime(&parent_id, &assertion.title, file);
            tracing::trace!(id = %test.id, "runtime test");
            suite.tests_mut().push_back(test);
        }
        return Ok(());
    };

    if title.is_empty() {
        return Err(err_msg!(
            Contract,
            "assertion '{}' has an empty ancestor title below '{}'",
            assertion.title,
            suite.id()
        ));
    }

    let parent_id = suite.id().to_string();
    let describes = suite.describe_blocks_mut();
    match describes.iter().position(|d| &d.label == title) {
        Some(index) => {
            if let Some(describe) = describes.get_mut(index) {
                place(describe, rest, assertion, file)?;
            }
        }
        None => {
            warn_on_delimiter(title);
            let mut describe = DescribeNode::runtime(&parent_id, title, file);
            tracing::trace!(id = %describe.id, "runtime describe");
            place(&mut describe, rest, assertion, file)?;
            describes.push_back(describe);
        }
    }
    Ok(())
}

fn warn_on_delimiter(title: &str) {
    if contains_delimiter(title) {
        tracing::warn!(title, "title contains an id delimiter; its id will not decode cleanly");
    }
}
