// CLI behaviour through the built binary.
// Requires: assert_cmd, predicates, tempfile in [dev-dependencies]

mod common;

use std::fs;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};
use tempfile::TempDir;

use common::*;
use testscope::tree::Node;

fn scope_cmd() -> Command {
    Command::cargo_bin("testscope").unwrap()
}

fn write_tree(dir: &TempDir) -> std::path::PathBuf {
    let tree = project(|id| {
        vec![file(id, "a.test.js", |id| {
            vec![
                describe(id, "Foo", 1, |id| vec![test(id, "bar", 2)]),
                describe(id, "Baz", 4, |id| vec![test(id, "qux", 5)]),
            ]
        })]
    });
    let path = dir.path().join("tree.json");
    fs::write(&path, serde_json::to_string(&Node::ProjectRoot(tree)).unwrap()).unwrap();
    path
}

fn stdout_json(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

#[test]
fn encode_and_decode() {
    let encoded = stdout_json(scope_cmd().args([
        "encode",
        "--project",
        "p",
        "--file",
        "/a.test.js",
        "--describe",
        "Foo",
        "--describe",
        "Bar",
        "--test",
        "baz",
    ]));
    assert_eq!(encoded, "p:/a.test.js§Foo§§Bar§¶baz¶");

    let decoded = stdout_json(scope_cmd().args(["decode", "p:/a.test.js§Foo§§Bar§¶baz¶"]));
    assert_eq!(decoded["projectId"], "p");
    assert_eq!(decoded["fileName"], "/a.test.js");
    assert_eq!(decoded["describeIds"], serde_json::json!(["Foo", "Bar"]));
    assert_eq!(decoded["testId"], "baz");
}

#[test]
fn runner_filter_prints_patterns_or_null() {
    let filter = stdout_json(scope_cmd().args(["runner-filter", "p:/a.test.js§Foo§¶bar¶"]));
    assert_eq!(filter["testFileNamePattern"], r"/a\.test\.js");
    assert_eq!(filter["testNamePattern"], "^Foo bar$");

    let everything = stdout_json(scope_cmd().args(["runner-filter", "root"]));
    assert!(everything.is_null());

    let args = stdout_json(scope_cmd().args(["runner-filter", "--args", "p:/a.test.js§Foo§"]));
    assert_eq!(
        args,
        serde_json::json!(["--testPathPattern", r"/a\.test\.js", "--testNamePattern", "^Foo "])
    );
}

#[test]
fn filter_prunes_a_tree_file() {
    let dir = TempDir::new().unwrap();
    let tree = write_tree(&dir);
    let selected = id_of("a.test.js", &["Foo"], None);
    let filtered = stdout_json(
        scope_cmd()
            .arg("filter")
            .arg("--tree")
            .arg(&tree)
            .args(["--mode", "literal"])
            .arg(&selected),
    );
    assert_eq!(filtered["type"], "projectRootNode");
    let describes = filtered["files"][0]["describeBlocks"].as_array().unwrap();
    assert_eq!(describes.len(), 1);
    assert_eq!(describes[0]["label"], "Foo");
}

#[test]
fn merge_adds_runtime_nodes() {
    let dir = TempDir::new().unwrap();
    let tree = write_tree(&dir);
    let results = dir.path().join("results.json");
    fs::write(
        &results,
        r#"[{"name": "/mock-project/a.test.js", "assertionResults": [
            {"ancestorTitles": ["Foo"], "title": "bar (1)", "status": "passed"}
        ]}]"#,
    )
    .unwrap();
    let config = dir.path().join("scope.yaml");
    fs::write(&config, "matchMode: literal\npathNormalization: exact\n").unwrap();

    let merged = stdout_json(
        scope_cmd()
            .arg("merge")
            .arg("--tree")
            .arg(&tree)
            .arg("--results")
            .arg(&results)
            .arg("--config")
            .arg(&config),
    );
    let tests = merged["files"][0]["describeBlocks"][0]["tests"].as_array().unwrap();
    assert_eq!(tests.len(), 2);
    assert_eq!(tests[1]["label"], "bar (1)");
    assert_eq!(tests[1]["runtimeDiscovered"], true);
}

#[test]
fn errors_are_rendered_as_diagnostics() {
    let dir = TempDir::new().unwrap();
    let tree = write_tree(&dir);
    let config = dir.path().join("scope.yaml");
    fs::write(&config, "matchMode: fuzzy\n").unwrap();

    scope_cmd()
        .arg("filter")
        .arg("--tree")
        .arg(&tree)
        .arg("--config")
        .arg(&config)
        .arg("root")
        .assert()
        .failure()
        .stderr(contains("testscope::config").or(contains("help:")));

    scope_cmd()
        .args(["filter", "--tree"])
        .arg(dir.path().join("missing.json"))
        .assert()
        .failure()
        .stderr(contains("testscope::io"));
}
