//! Translates a selection of encoded ids into the runner's file and test name filters.

use serde::{Deserialize, Serialize};

use crate::id::{selects_everything, TestId};
use crate::pattern::{escape_literal, translate_placeholders, PatternFragment};

/// Filter handed to the runner client, one regex alternation per flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestFilter {
    pub test_file_name_pattern: String,
    pub test_name_pattern: String,
}

impl TestFilter {
    /// Command line flags for the runner, skipping empty patterns.
    pub fn runner_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(4);
        if !self.test_file_name_pattern.is_empty() {
            args.push("--testPathPattern".to_string());
            args.push(self.test_file_name_pattern.clone());
        }
        if !self.test_name_pattern.is_empty() {
            args.push("--testNamePattern".to_string());
            args.push(self.test_name_pattern.clone());
        }
        args
    }
}

/// Builds the runner filter for `selection`.
///
/// Returns `None` ("run everything") when the selection is empty, contains the
/// workspace root, or contains an id without a file name.
#[tracing::instrument(level = "debug", skip_all, fields(count = selection.len()))]
pub fn build_test_filter<S: AsRef<str>>(selection: &[S]) -> Option<TestFilter> {
    if selects_everything(selection) {
        tracing::debug!("selection covers the whole workspace");
        return None;
    }

    let ids: Vec<TestId> = selection.iter().map(|s| TestId::decode(s.as_ref())).collect();
    if let Some(id) = ids.iter().find(|id| id.file_name.is_none()) {
        tracing::debug!(project = %id.project_id, "project-level selection, running everything");
        return None;
    }

    let names: Vec<PatternFragment> = ids.iter().map(test_name_pattern).collect();

    let mut files: Vec<PatternFragment> = Vec::with_capacity(ids.len());
    for file_name in ids.iter().filter_map(|id| id.file_name.as_deref()) {
        let escaped = escape_literal(file_name);
        if !files.contains(&escaped) {
            files.push(escaped);
        }
    }

    let filter = TestFilter {
        test_file_name_pattern: PatternFragment::alternation(&files).into_string(),
        test_name_pattern: PatternFragment::alternation(&names).into_string(),
    };
    tracing::trace!(?filter, "built runner filter");
    Some(filter)
}

/// Runner test names are the describe titles and the test title joined by spaces.
///
/// A test title must match to the end. Without one, the describe chain keeps a trailing
/// space so `Foo` does not select `Foobar`; a file-level id matches every name.
fn test_name_pattern(id: &TestId) -> PatternFragment {
    let mut parts: Vec<PatternFragment> = id
        .describe_ids
        .iter()
        .flatten()
        .map(|describe| translate_placeholders(describe))
        .collect();
    match id.test_id.as_deref().filter(|t| !t.is_empty()) {
        Some(test_id) => parts.push(translate_placeholders(test_id).anchored_end()),
        None if !parts.is_empty() => parts.push(PatternFragment::empty()),
        None => {}
    }
    PatternFragment::join(&parts, " ").anchored_start()
}

#[cfg(test)]
mod runner_filter_tests {
    use super::*;
    use crate::id::RUN_ALL_ID;

    fn id(describes: &[&str], test: Option<&str>) -> String {
        let mut id = TestId::project("p").with_file("/src/a.test.js");
        for describe in describes {
            id = id.with_describe(*describe);
        }
        if let Some(test) = test {
            id = id.with_test(test);
        }
        id.encode()
    }

    #[test]
    fn test_run_everything_cases() {
        assert_eq!(build_test_filter::<String>(&[]), None);
        assert_eq!(build_test_filter(&[id(&["Foo"], None), RUN_ALL_ID.to_string()]), None);
        assert_eq!(build_test_filter(&[id(&["Foo"], None), "p".to_string()]), None);
    }

    #[test]
    fn test_single_test() {
        let filter = build_test_filter(&[id(&["Foo", "Bar"], Some("baz"))]).unwrap();
        assert_eq!(filter.test_file_name_pattern, r"/src/a\.test\.js");
        assert_eq!(filter.test_name_pattern, "^Foo Bar baz$");
    }

    #[test]
    fn test_describe_only_keeps_trailing_space() {
        let filter = build_test_filter(&[id(&["Foo"], None)]).unwrap();
        assert_eq!(filter.test_name_pattern, "^Foo ");
    }

    #[test]
    fn test_file_only_matches_everything() {
        let filter = build_test_filter(&[id(&[], None)]).unwrap();
        assert_eq!(filter.test_name_pattern, "^");
    }

    #[test]
    fn test_test_without_describe() {
        let filter = build_test_filter(&[id(&[], Some("adds (1 + 2)"))]).unwrap();
        assert_eq!(filter.test_name_pattern, r"^adds \(1 \+ 2\)$");
    }

    #[test]
    fn test_alternation_and_distinct_files() {
        let other = TestId::project("p").with_file("/src/b.test.js").with_test("x").encode();
        let filter = build_test_filter(&[
            id(&["Foo"], Some("one")),
            id(&["Foo"], Some("two")),
            other,
        ])
        .unwrap();
        assert_eq!(filter.test_file_name_pattern, r"/src/a\.test\.js|/src/b\.test\.js");
        assert_eq!(filter.test_name_pattern, "^Foo one$|^Foo two$|^x$");
    }

    #[test]
    fn test_placeholders_become_patterns() {
        let filter = build_test_filter(&[id(&["sum %s"], Some("returns %i"))]).unwrap();
        let re = regex::Regex::new(&filter.test_name_pattern).unwrap();
        assert!(re.is_match("sum anything returns -3"));
        assert!(!re.is_match("sum anything returns 3.5"));
    }

    #[test]
    fn test_runner_args() {
        let filter = build_test_filter(&[id(&["Foo"], Some("bar"))]).unwrap();
        assert_eq!(
            filter.runner_args(),
            vec![
                "--testPathPattern".to_string(),
                r"/src/a\.test\.js".to_string(),
                "--testNamePattern".to_string(),
                "^Foo bar$".to_string(),
            ]
        );
    }
}
