//! The test tree: workspace → projects → folders → files → describes → tests.
//!
//! Trees are values. Child collections are persistent vectors, so cloning a node is
//! cheap and a rebuilt parent shares every child it did not touch. Nothing in this
//! crate mutates a tree that was handed to it.

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::id::{DESCRIBE_ID_SEPARATOR, RUN_ALL_ID, TEST_ID_SEPARATOR};

// ============================================================================
// NODE TYPES
// ============================================================================

/// Any node of the tree, tagged by `type` when serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    #[serde(rename = "workspaceRootNode")]
    WorkspaceRoot(WorkspaceRootNode),
    #[serde(rename = "projectRootNode")]
    ProjectRoot(ProjectRootNode),
    #[serde(rename = "folder")]
    Folder(FolderNode),
    #[serde(rename = "file")]
    File(FileNode),
    #[serde(rename = "fileWithParseError")]
    FileWithParseError(FileWithParseErrorNode),
    #[serde(rename = "describe")]
    Describe(DescribeNode),
    #[serde(rename = "test")]
    Test(TestNode),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceRootNode {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub projects: Vector<ProjectRootNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRootNode {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub folders: Vector<FolderNode>,
    #[serde(default)]
    pub files: Vector<FileEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderNode {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub folders: Vector<FolderNode>,
    #[serde(default)]
    pub files: Vector<FileEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    pub id: String,
    pub label: String,
    pub file: String,
    #[serde(default)]
    pub describe_blocks: Vector<DescribeNode>,
    #[serde(default)]
    pub tests: Vector<TestNode>,
}

/// A file the source parser could not read; its children are only ever runtime-discovered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileWithParseErrorNode {
    pub id: String,
    pub label: String,
    pub file: String,
    pub error: String,
    #[serde(default)]
    pub describe_blocks: Vector<DescribeNode>,
    #[serde(default)]
    pub tests: Vector<TestNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeNode {
    pub id: String,
    pub label: String,
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default)]
    pub runtime_discovered: bool,
    #[serde(default)]
    pub describe_blocks: Vector<DescribeNode>,
    #[serde(default)]
    pub tests: Vector<TestNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestNode {
    pub id: String,
    pub label: String,
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default)]
    pub runtime_discovered: bool,
}

/// A file child of a project or folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FileEntry {
    #[serde(rename = "file")]
    Parsed(FileNode),
    #[serde(rename = "fileWithParseError")]
    ParseError(FileWithParseErrorNode),
}

// ============================================================================
// CONSTRUCTORS
// ============================================================================

impl WorkspaceRootNode {
    pub fn new() -> Self {
        Self {
            id: RUN_ALL_ID.to_string(),
            label: "workspaceRootNode".to_string(),
            projects: Vector::new(),
        }
    }
}

impl Default for WorkspaceRootNode {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectRootNode {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            folders: Vector::new(),
            files: Vector::new(),
        }
    }
}

impl FolderNode {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            folders: Vector::new(),
            files: Vector::new(),
        }
    }
}

impl FileNode {
    pub fn new(id: impl Into<String>, label: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            file: file.into(),
            describe_blocks: Vector::new(),
            tests: Vector::new(),
        }
    }
}

impl FileWithParseErrorNode {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        file: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            file: file.into(),
            error: error.into(),
            describe_blocks: Vector::new(),
            tests: Vector::new(),
        }
    }
}

impl DescribeNode {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        file: impl Into<String>,
        line: Option<u32>,
        runtime_discovered: bool,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            file: file.into(),
            line,
            runtime_discovered,
            describe_blocks: Vector::new(),
            tests: Vector::new(),
        }
    }

    /// A describe reported by the runner but absent from the parsed source.
    pub fn runtime(parent_id: &str, label: &str, file: &str) -> Self {
        let id = format!("{parent_id}{DESCRIBE_ID_SEPARATOR}{label}{DESCRIBE_ID_SEPARATOR}");
        Self::new(id, label, file, None, true)
    }
}

impl TestNode {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        file: impl Into<String>,
        line: Option<u32>,
        runtime_discovered: bool,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            file: file.into(),
            line,
            runtime_discovered,
        }
    }

    /// A test reported by the runner but absent from the parsed source.
    pub fn runtime(parent_id: &str, label: &str, file: &str) -> Self {
        let id = format!("{parent_id}{TEST_ID_SEPARATOR}{label}{TEST_ID_SEPARATOR}");
        Self::new(id, label, file, None, true)
    }
}

// ============================================================================
// ACCESSORS
// ============================================================================

impl FileEntry {
    pub fn id(&self) -> &str {
        match self {
            FileEntry::Parsed(file) => &file.id,
            FileEntry::ParseError(file) => &file.id,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            FileEntry::Parsed(file) => &file.label,
            FileEntry::ParseError(file) => &file.label,
        }
    }

    /// Path of the source file.
    pub fn file(&self) -> &str {
        match self {
            FileEntry::Parsed(file) => &file.file,
            FileEntry::ParseError(file) => &file.file,
        }
    }

    pub fn describe_blocks(&self) -> &Vector<DescribeNode> {
        match self {
            FileEntry::Parsed(file) => &file.describe_blocks,
            FileEntry::ParseError(file) => &file.describe_blocks,
        }
    }

    pub fn tests(&self) -> &Vector<TestNode> {
        match self {
            FileEntry::Parsed(file) => &file.tests,
            FileEntry::ParseError(file) => &file.tests,
        }
    }
}

impl From<FileEntry> for Node {
    fn from(entry: FileEntry) -> Self {
        match entry {
            FileEntry::Parsed(file) => Node::File(file),
            FileEntry::ParseError(file) => Node::FileWithParseError(file),
        }
    }
}

impl From<ProjectRootNode> for Node {
    fn from(project: ProjectRootNode) -> Self {
        Node::ProjectRoot(project)
    }
}

impl From<WorkspaceRootNode> for Node {
    fn from(workspace: WorkspaceRootNode) -> Self {
        Node::WorkspaceRoot(workspace)
    }
}

impl Node {
    pub fn id(&self) -> &str {
        match self {
            Node::WorkspaceRoot(n) => &n.id,
            Node::ProjectRoot(n) => &n.id,
            Node::Folder(n) => &n.id,
            Node::File(n) => &n.id,
            Node::FileWithParseError(n) => &n.id,
            Node::Describe(n) => &n.id,
            Node::Test(n) => &n.id,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Node::WorkspaceRoot(n) => &n.label,
            Node::ProjectRoot(n) => &n.label,
            Node::Folder(n) => &n.label,
            Node::File(n) => &n.label,
            Node::FileWithParseError(n) => &n.label,
            Node::Describe(n) => &n.label,
            Node::Test(n) => &n.label,
        }
    }

    /// The `type` tag used in the serialized form.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::WorkspaceRoot(_) => "workspaceRootNode",
            Node::ProjectRoot(_) => "projectRootNode",
            Node::Folder(_) => "folder",
            Node::File(_) => "file",
            Node::FileWithParseError(_) => "fileWithParseError",
            Node::Describe(_) => "describe",
            Node::Test(_) => "test",
        }
    }
}
