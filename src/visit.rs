//! Read-only depth-first traversal of a tree.

use crate::tree::{
    DescribeNode, FileEntry, FileNode, FileWithParseErrorNode, FolderNode, Node, ProjectRootNode,
    TestNode, WorkspaceRootNode,
};

/// Callbacks for [`walk`]. Every method defaults to doing nothing.
pub trait NodeVisitor {
    fn visit_workspace_root(&mut self, _workspace: &WorkspaceRootNode) {}
    fn visit_project_root(&mut self, _project: &ProjectRootNode) {}
    fn visit_folder(&mut self, _folder: &FolderNode) {}
    fn visit_file(&mut self, _file: &FileNode) {}
    fn visit_file_with_parse_error(&mut self, _file: &FileWithParseErrorNode) {}
    fn visit_describe(&mut self, _describe: &DescribeNode) {}
    fn visit_test(&mut self, _test: &TestNode) {}
}

/// Visits `node` and its descendants, parents before children and siblings in order.
///
/// Projects and folders visit their files before their folders; files and describes
/// visit their describes before their tests.
pub fn walk<V: NodeVisitor + ?Sized>(node: &Node, visitor: &mut V) {
    match node {
        Node::WorkspaceRoot(workspace) => walk_workspace(workspace, visitor),
        Node::ProjectRoot(project) => walk_project(project, visitor),
        Node::Folder(folder) => walk_folder(folder, visitor),
        Node::File(file) => {
            visitor.visit_file(file);
            walk_children(file.describe_blocks.iter(), file.tests.iter(), visitor);
        }
        Node::FileWithParseError(file) => {
            visitor.visit_file_with_parse_error(file);
            walk_children(file.describe_blocks.iter(), file.tests.iter(), visitor);
        }
        Node::Describe(describe) => walk_describe(describe, visitor),
        Node::Test(test) => visitor.visit_test(test),
    }
}

pub fn walk_workspace<V: NodeVisitor + ?Sized>(workspace: &WorkspaceRootNode, visitor: &mut V) {
    visitor.visit_workspace_root(workspace);
    for project in &workspace.projects {
        walk_project(project, visitor);
    }
}

pub fn walk_project<V: NodeVisitor + ?Sized>(project: &ProjectRootNode, visitor: &mut V) {
    visitor.visit_project_root(project);
    for file in &project.files {
        walk_file(file, visitor);
    }
    for folder in &project.folders {
        walk_folder(folder, visitor);
    }
}

fn walk_folder<V: NodeVisitor + ?Sized>(folder: &FolderNode, visitor: &mut V) {
    visitor.visit_folder(folder);
    for file in &folder.files {
        walk_file(file, visitor);
    }
    for child in &folder.folders {
        walk_folder(child, visitor);
    }
}

fn walk_file<V: NodeVisitor + ?Sized>(entry: &FileEntry, visitor: &mut V) {
    match entry {
        FileEntry::Parsed(file) => visitor.visit_file(file),
        FileEntry::ParseError(file) => visitor.visit_file_with_parse_error(file),
    }
    walk_children(entry.describe_blocks().iter(), entry.tests().iter(), visitor);
}

fn walk_describe<V: NodeVisitor + ?Sized>(describe: &DescribeNode, visitor: &mut V) {
    visitor.visit_describe(describe);
    walk_children(describe.describe_blocks.iter(), describe.tests.iter(), visitor);
}

fn walk_children<'a, V: NodeVisitor + ?Sized>(
    describes: impl Iterator<Item = &'a DescribeNode>,
    tests: impl Iterator<Item = &'a TestNode>,
    visitor: &mut V,
) {
    for describe in describes {
        walk_describe(describe, visitor);
    }
    for test in tests {
        visitor.visit_test(test);
    }
}

// ============================================================================
// COLLECTORS
// ============================================================================

/// Every node id under `node`, in [`walk`] order.
pub fn collect_ids(node: &Node) -> Vec<String> {
    #[derive(Default)]
    struct Ids(Vec<String>);

    impl NodeVisitor for Ids {
        fn visit_workspace_root(&mut self, n: &WorkspaceRootNode) {
            self.0.push(n.id.clone());
        }
        fn visit_project_root(&mut self, n: &ProjectRootNode) {
            self.0.push(n.id.clone());
        }
        fn visit_folder(&mut self, n: &FolderNode) {
            self.0.push(n.id.clone());
        }
        fn visit_file(&mut self, n: &FileNode) {
            self.0.push(n.id.clone());
        }
        fn visit_file_with_parse_error(&mut self, n: &FileWithParseErrorNode) {
            self.0.push(n.id.clone());
        }
        fn visit_describe(&mut self, n: &DescribeNode) {
            self.0.push(n.id.clone());
        }
        fn visit_test(&mut self, n: &TestNode) {
            self.0.push(n.id.clone());
        }
    }

    let mut ids = Ids::default();
    walk(node, &mut ids);
    ids.0
}

/// Counts of describes and tests, split by origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub files: usize,
    pub describes: usize,
    pub tests: usize,
    pub runtime_describes: usize,
    pub runtime_tests: usize,
}

impl NodeVisitor for TreeStats {
    fn visit_file(&mut self, _file: &FileNode) {
        self.files += 1;
    }
    fn visit_file_with_parse_error(&mut self, _file: &FileWithParseErrorNode) {
        self.files += 1;
    }
    fn visit_describe(&mut self, describe: &DescribeNode) {
        self.describes += 1;
        if describe.runtime_discovered {
            self.runtime_describes += 1;
        }
    }
    fn visit_test(&mut self, test: &TestNode) {
        self.tests += 1;
        if test.runtime_discovered {
            self.runtime_tests += 1;
        }
    }
}

impl TreeStats {
    pub fn of(node: &Node) -> Self {
        let mut stats = TreeStats::default();
        walk(node, &mut stats);
        stats
    }
}
