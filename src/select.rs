//! Pruning a tree down to a selection of encoded ids.
//!
//! A node is kept when its id is a prefix of some selected id (it lies on the path to a
//! selection). A node whose id equals a selected id is kept with its whole subtree.
//! In [`MatchMode::Regex`] describes and tests are additionally compared through
//! placeholder-aware patterns, so that a runtime title such as `adds 5` and its
//! template `adds %i` select each other. The plain string checks always run first;
//! patterns are only consulted when they fail.

use im::Vector;
use once_cell::unsync::OnceCell;
use regex::{Regex, RegexSet};

use crate::config::MatchMode;
use crate::id::{selects_everything, TestId};
use crate::pattern::{has_placeholders, PatternFragment};
use crate::tree::{
    DescribeNode, FileEntry, FolderNode, Node, ProjectRootNode, TestNode, WorkspaceRootNode,
};
use crate::ScopeError;

// ============================================================================
// SELECTION
// ============================================================================

/// Patterns compiled once per selected id.
#[derive(Debug, Clone)]
struct SelectedPatterns {
    /// The selected id itself.
    exact: Regex,
    /// Any describe on the path from the first describe down to the selected id.
    ancestors: Regex,
    /// Tests inside the selection: anchored at the end only for a test-level id.
    tests: Regex,
}

impl SelectedPatterns {
    fn compile(id: &TestId) -> Result<Option<Self>, ScopeError> {
        if id.file_name.is_none() {
            return Ok(None);
        }
        let pattern = id.to_placeholder_regex();
        let encoded = pattern.encode();
        let tests = if pattern.test_id.is_some() {
            encoded.anchored()
        } else {
            encoded.anchored_start()
        };
        Ok(Some(Self {
            exact: encoded.anchored().compile()?,
            ancestors: pattern.encode_ancestor_chain().anchored().compile()?,
            tests: tests.compile()?,
        }))
    }
}

/// A set of selected ids prepared for [`filter_tree`].
#[derive(Debug, Clone)]
pub struct Selection {
    ids: Vec<String>,
    mode: MatchMode,
    everything: bool,
    patterns: Vec<SelectedPatterns>,
}

impl Selection {
    /// Prepares `ids` for filtering, compiling patterns up front in regex mode.
    pub fn new<S: AsRef<str>>(ids: &[S], mode: MatchMode) -> Result<Self, ScopeError> {
        let everything = selects_everything(ids);
        let ids: Vec<String> = ids.iter().map(|s| s.as_ref().to_string()).collect();
        let mut patterns = Vec::new();
        if mode == MatchMode::Regex && !everything {
            for id in &ids {
                if let Some(compiled) = SelectedPatterns::compile(&TestId::decode(id))? {
                    patterns.push(compiled);
                }
            }
        }
        Ok(Self {
            ids,
            mode,
            everything,
            patterns,
        })
    }

    /// A literal-mode selection; never fails since nothing is compiled.
    pub fn literal<S: AsRef<str>>(ids: &[S]) -> Self {
        Self {
            everything: selects_everything(ids),
            ids: ids.iter().map(|s| s.as_ref().to_string()).collect(),
            mode: MatchMode::Literal,
            patterns: Vec::new(),
        }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// True when filtering returns the tree unchanged.
    pub fn selects_everything(&self) -> bool {
        self.everything
    }

    fn is_selected(&self, id: &str) -> bool {
        self.ids.iter().any(|s| s == id)
    }

    fn is_on_path(&self, id: &str) -> bool {
        self.ids.iter().any(|s| s.starts_with(id))
    }

    fn describe_is_selected(&self, node: &Candidate<'_>) -> bool {
        if self.is_selected(node.id) {
            return true;
        }
        if self.mode == MatchMode::Literal {
            return false;
        }
        self.patterns.iter().any(|p| p.exact.is_match(node.id)) || self.template_matches(node, true)
    }

    fn describe_is_on_path(&self, node: &Candidate<'_>) -> bool {
        if self.is_on_path(node.id) {
            return true;
        }
        if self.mode == MatchMode::Literal {
            return false;
        }
        self.patterns.iter().any(|p| p.ancestors.is_match(node.id))
            || self.template_matches(node, false)
    }

    fn keeps_test(&self, node: &Candidate<'_>) -> bool {
        if self.is_on_path(node.id) {
            return true;
        }
        if self.mode == MatchMode::Literal {
            return false;
        }
        self.patterns.iter().any(|p| p.tests.is_match(node.id)) || self.template_matches(node, true)
    }

    /// Matches selected ids against the patterns of a templated node id.
    ///
    /// With `whole` the selected id must be exactly this node, otherwise it only has
    /// to start with it.
    fn template_matches(&self, node: &Candidate<'_>, whole: bool) -> bool {
        let Some(set) = node.template() else {
            return false;
        };
        let index = if whole { Candidate::WHOLE } else { Candidate::PREFIX };
        self.ids.iter().any(|s| set.matches(s).matched(index))
    }
}

/// A tree node id being tested against a selection.
///
/// The patterns of a templated id are compiled on first use and shared by every
/// check made for the same node.
struct Candidate<'a> {
    id: &'a str,
    template: OnceCell<Option<RegexSet>>,
}

impl<'a> Candidate<'a> {
    const WHOLE: usize = 0;
    const PREFIX: usize = 1;

    fn new(id: &'a str) -> Self {
        Self {
            id,
            template: OnceCell::new(),
        }
    }

    fn template(&self) -> Option<&RegexSet> {
        self.template.get_or_init(|| compile_template(self.id)).as_ref()
    }
}

fn compile_template(node_id: &str) -> Option<RegexSet> {
    if !node_id.contains('%') {
        return None;
    }
    let id = TestId::decode(node_id);
    let templated = id
        .describe_ids
        .iter()
        .flatten()
        .chain(id.test_id.iter())
        .any(|title| has_placeholders(title));
    if !templated {
        return None;
    }
    let encoded = id.to_placeholder_regex().encode();
    match PatternFragment::compile_set([&encoded.anchored(), &encoded.anchored_start()]) {
        Ok(set) => Some(set),
        Err(e) => {
            tracing::warn!(node = node_id, error = %e, "skipping template match");
            None
        }
    }
}

// ============================================================================
// FILTERING
// ============================================================================

/// Returns a copy of `node` keeping only the branches in `selection`.
pub fn filter_tree(node: &Node, selection: &Selection) -> Node {
    if selection.selects_everything() {
        return node.clone();
    }
    match node {
        Node::WorkspaceRoot(workspace) => Node::WorkspaceRoot(filter_workspace(workspace, selection)),
        Node::ProjectRoot(project) => Node::ProjectRoot(filter_project(project, selection)),
        Node::Folder(folder) => Node::Folder(filter_folder(folder, selection)),
        Node::File(file) => filter_file(&FileEntry::Parsed(file.clone()), selection).into(),
        Node::FileWithParseError(file) => {
            filter_file(&FileEntry::ParseError(file.clone()), selection).into()
        }
        Node::Describe(describe) => Node::Describe(filter_describe(describe, selection)),
        Node::Test(test) => Node::Test(test.clone()),
    }
}

/// Convenience wrapper building the [`Selection`] first.
pub fn filter_tree_with<S: AsRef<str>>(
    node: &Node,
    ids: &[S],
    mode: MatchMode,
) -> Result<Node, ScopeError> {
    let selection = Selection::new(ids, mode)?;
    Ok(filter_tree(node, &selection))
}

pub fn filter_workspace(workspace: &WorkspaceRootNode, selection: &Selection) -> WorkspaceRootNode {
    if selection.selects_everything() || selection.is_selected(&workspace.id) {
        return workspace.clone();
    }
    let projects = workspace
        .projects
        .iter()
        .filter(|p| selection.is_on_path(&p.id))
        .map(|p| filter_project(p, selection))
        .collect();
    WorkspaceRootNode {
        projects,
        ..workspace.clone()
    }
}

#[tracing::instrument(level = "debug", skip_all, fields(project = %project.id, mode = ?selection.mode()))]
pub fn filter_project(project: &ProjectRootNode, selection: &Selection) -> ProjectRootNode {
    if selection.selects_everything() || selection.is_selected(&project.id) {
        return project.clone();
    }
    let filtered = ProjectRootNode {
        folders: filter_folders(&project.folders, selection),
        files: filter_files(&project.files, selection),
        ..project.clone()
    };
    tracing::debug!(
        files = filtered.files.len(),
        folders = filtered.folders.len(),
        "project filtered"
    );
    filtered
}

fn filter_folder(folder: &FolderNode, selection: &Selection) -> FolderNode {
    if selection.is_selected(&folder.id) {
        return folder.clone();
    }
    FolderNode {
        folders: filter_folders(&folder.folders, selection),
        files: filter_files(&folder.files, selection),
        ..folder.clone()
    }
}

fn filter_folders(folders: &Vector<FolderNode>, selection: &Selection) -> Vector<FolderNode> {
    folders
        .iter()
        .filter(|f| selection.is_on_path(&f.id))
        .map(|f| filter_folder(f, selection))
        .collect()
}

fn filter_files(files: &Vector<FileEntry>, selection: &Selection) -> Vector<FileEntry> {
    files
        .iter()
        .filter(|f| selection.is_on_path(f.id()))
        .map(|f| filter_file(f, selection))
        .collect()
}

fn filter_file(entry: &FileEntry, selection: &Selection) -> FileEntry {
    if selection.is_selected(entry.id()) {
        return entry.clone();
    }
    match entry {
        FileEntry::Parsed(file) => {
            let mut file = file.clone();
            file.describe_blocks = filter_describes(&file.describe_blocks, selection);
            file.tests = filter_tests(&file.tests, selection);
            FileEntry::Parsed(file)
        }
        // Never parsed, so there is nothing inside to narrow down.
        FileEntry::ParseError(_) => entry.clone(),
    }
}

fn filter_describe(describe: &DescribeNode, selection: &Selection) -> DescribeNode {
    filter_candidate(describe, &Candidate::new(&describe.id), selection)
}

fn filter_candidate(
    describe: &DescribeNode,
    node: &Candidate<'_>,
    selection: &Selection,
) -> DescribeNode {
    if selection.describe_is_selected(node) {
        return describe.clone();
    }
    DescribeNode {
        describe_blocks: filter_describes(&describe.describe_blocks, selection),
        tests: filter_tests(&describe.tests, selection),
        ..describe.clone()
    }
}

fn filter_describes(describes: &Vector<DescribeNode>, selection: &Selection) -> Vector<DescribeNode> {
    describes
        .iter()
        .filter_map(|d| {
            let node = Candidate::new(&d.id);
            selection
                .describe_is_on_path(&node)
                .then(|| filter_candidate(d, &node, selection))
        })
        .collect()
}

fn filter_tests(tests: &Vector<TestNode>, selection: &Selection) -> Vector<TestNode> {
    tests
        .iter()
        .filter(|t| selection.keeps_test(&Candidate::new(&t.id)))
        .cloned()
        .collect()
}
