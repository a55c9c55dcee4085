//! Shared tree builders for integration tests.
//!
//! Ids are derived from the parent's [`TestId`] exactly as the source parser derives
//! them, so the builders double as a check of the prefix layout.

#![allow(dead_code)]

use testscope::id::TestId;
use testscope::tree::{
    DescribeNode, FileEntry, FileNode, FileWithParseErrorNode, FolderNode, ProjectRootNode,
    TestNode,
};

pub const PROJECT_NAME: &str = "mock-project";
pub const ROOT_PATH: &str = "/mock-project";

/// Id every file of the mock project hangs from.
pub fn base_id() -> TestId {
    TestId::project(PROJECT_NAME).with_file(ROOT_PATH)
}

pub enum Entry {
    Folder(FolderNode),
    File(FileEntry),
}

pub enum Child {
    Describe(DescribeNode),
    Test(TestNode),
}

pub fn project(children: impl FnOnce(&TestId) -> Vec<Entry>) -> ProjectRootNode {
    let mut project = ProjectRootNode::new(PROJECT_NAME, PROJECT_NAME);
    for child in children(&base_id()) {
        match child {
            Entry::Folder(folder) => project.folders.push_back(folder),
            Entry::File(file) => project.files.push_back(file),
        }
    }
    project
}

fn nested_path(parent: &TestId, name: &str) -> TestId {
    let path = format!("{}/{}", parent.file_name.as_deref().unwrap_or_default(), name);
    TestId {
        file_name: Some(path),
        ..parent.clone()
    }
}

pub fn folder(parent: &TestId, name: &str, children: impl FnOnce(&TestId) -> Vec<Entry>) -> Entry {
    let id = nested_path(parent, name);
    let mut folder = FolderNode::new(id.encode(), name);
    for child in children(&id) {
        match child {
            Entry::Folder(inner) => folder.folders.push_back(inner),
            Entry::File(file) => folder.files.push_back(file),
        }
    }
    Entry::Folder(folder)
}

pub fn file(parent: &TestId, name: &str, describes: impl FnOnce(&TestId) -> Vec<Child>) -> Entry {
    let id = nested_path(parent, name);
    let path = id.file_name.clone().unwrap_or_default();
    let mut file = FileNode::new(id.encode(), name, path);
    for child in describes(&id) {
        match child {
            Child::Describe(d) => file.describe_blocks.push_back(d),
            Child::Test(t) => file.tests.push_back(t),
        }
    }
    Entry::File(FileEntry::Parsed(file))
}

pub fn broken_file(parent: &TestId, name: &str, error: &str) -> Entry {
    let id = nested_path(parent, name);
    let path = id.file_name.clone().unwrap_or_default();
    Entry::File(FileEntry::ParseError(FileWithParseErrorNode::new(
        id.encode(),
        name,
        path,
        error,
    )))
}

pub fn describe(
    parent: &TestId,
    label: &str,
    line: u32,
    children: impl FnOnce(&TestId) -> Vec<Child>,
) -> Child {
    let id = parent.clone().with_describe(label);
    let path = id.file_name.clone().unwrap_or_default();
    let mut node = DescribeNode::new(id.encode(), label, path, Some(line), false);
    for child in children(&id) {
        match child {
            Child::Describe(d) => node.describe_blocks.push_back(d),
            Child::Test(t) => node.tests.push_back(t),
        }
    }
    Child::Describe(node)
}

pub fn test(parent: &TestId, label: &str, line: u32) -> Child {
    let id = parent.clone().with_test(label);
    let path = id.file_name.clone().unwrap_or_default();
    Child::Test(TestNode::new(id.encode(), label, path, Some(line), false))
}

/// Encoded id of a node below `/mock-project/<file>`.
pub fn id_of(file: &str, describes: &[&str], test: Option<&str>) -> String {
    let mut id = TestId::project(PROJECT_NAME).with_file(format!("{ROOT_PATH}/{file}"));
    for describe in describes {
        id = id.with_describe(*describe);
    }
    if let Some(test) = test {
        id = id.with_test(test);
    }
    id.encode()
}

/// The first parsed file of a project.
pub fn first_file(project: &ProjectRootNode) -> &FileNode {
    match project.files.front() {
        Some(FileEntry::Parsed(file)) => file,
        other => panic!("expected a parsed file, got {other:?}"),
    }
}

pub fn labels_of_describes(describes: &im::Vector<DescribeNode>) -> Vec<&str> {
    describes.iter().map(|d| d.label.as_str()).collect()
}

pub fn labels_of_tests(tests: &im::Vector<TestNode>) -> Vec<&str> {
    tests.iter().map(|t| t.label.as_str()).collect()
}

/// Describe at `path` (by labels) below the file, panicking when absent.
pub fn describe_at<'a>(file: &'a FileNode, path: &[&str]) -> &'a DescribeNode {
    let (first, rest) = path.split_first().expect("non-empty path");
    let mut current = file
        .describe_blocks
        .iter()
        .find(|d| d.label == *first)
        .unwrap_or_else(|| panic!("no describe '{first}'"));
    for label in rest {
        current = current
            .describe_blocks
            .iter()
            .find(|d| d.label == *label)
            .unwrap_or_else(|| panic!("no describe '{label}'"));
    }
    current
}
