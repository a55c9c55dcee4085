//! Hierarchical test identifiers.
//!
//! A [`TestId`] names a project, a file inside it, a chain of describe blocks and a
//! test. Its encoded form keeps ancestor containment as a plain string prefix:
//!
//! ```text
//! project                      -> my-app
//! project + file               -> my-app:/src/a.test.js
//! + describes Foo, Bar         -> my-app:/src/a.test.js§Foo§§Bar§
//! + test baz                   -> my-app:/src/a.test.js§Foo§§Bar§¶baz¶
//! ```
//!
//! Describe titles are each wrapped in the boundary delimiter, so consecutive describes
//! are separated by a doubled delimiter and the chain ends with a single one. The
//! delimiters inside raw titles are not escaped: a title containing `§` or `¶` (or a
//! project name containing `:`) does not survive a round trip.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::pattern::{escape_literal, translate_segment_placeholders, PatternFragment};

/// Separates the project id from the file name.
pub const PROJECT_ID_SEPARATOR: &str = ":";
/// Wraps every describe title.
pub const DESCRIBE_ID_SEPARATOR: &str = "§";
/// Wraps the test title.
pub const TEST_ID_SEPARATOR: &str = "¶";
/// Id of the workspace root; selecting it means "run everything".
pub const RUN_ALL_ID: &str = "root";

/// True when a selection means "everything": empty, or containing [`RUN_ALL_ID`].
pub fn selects_everything<S: AsRef<str>>(selection: &[S]) -> bool {
    selection.is_empty() || selection.iter().any(|s| s.as_ref() == RUN_ALL_ID)
}

/// True when `label` contains one of the delimiter tokens and would corrupt an id.
pub fn contains_delimiter(label: &str) -> bool {
    label.contains(DESCRIBE_ID_SEPARATOR) || label.contains(TEST_ID_SEPARATOR)
}

// ============================================================================
// TEST ID
// ============================================================================

/// Logical identifier of a node in the project/file/describe*/test hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestId {
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub describe_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_id: Option<String>,
}

impl TestId {
    /// Identifier of a whole project.
    pub fn project(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            file_name: None,
            describe_ids: None,
            test_id: None,
        }
    }

    pub fn with_file(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Appends one describe title to the chain.
    pub fn with_describe(mut self, describe: impl Into<String>) -> Self {
        self.describe_ids
            .get_or_insert_with(Vec::new)
            .push(describe.into());
        self
    }

    pub fn with_test(mut self, test_id: impl Into<String>) -> Self {
        self.test_id = Some(test_id.into());
        self
    }

    /// The identifier one level up, or `None` for a project id.
    pub fn parent(&self) -> Option<TestId> {
        let mut parent = self.clone();
        if parent.test_id.take().is_some() {
            return Some(parent);
        }
        if let Some(describes) = parent.describe_ids.as_mut() {
            describes.pop();
            if describes.is_empty() {
                parent.describe_ids = None;
            }
            return Some(parent);
        }
        parent.file_name.take().map(|_| parent)
    }

    pub fn encode(&self) -> String {
        let mut out = self.project_id.clone();
        let Some(file_name) = present(&self.file_name) else {
            return out;
        };
        out.push_str(PROJECT_ID_SEPARATOR);
        out.push_str(file_name);

        if let Some(describes) = self.describe_ids.as_ref().filter(|d| !d.is_empty()) {
            let doubled = DESCRIBE_ID_SEPARATOR.repeat(2);
            out.push_str(DESCRIBE_ID_SEPARATOR);
            out.push_str(&describes.join(&doubled));
            out.push_str(DESCRIBE_ID_SEPARATOR);
        }

        if let Some(test_id) = present(&self.test_id) {
            out.push_str(TEST_ID_SEPARATOR);
            out.push_str(test_id);
            out.push_str(TEST_ID_SEPARATOR);
        }
        out
    }

    /// Parses an encoded id. Never fails: missing segments come back as `None`.
    pub fn decode(encoded: &str) -> TestId {
        let Some((project_id, after_project)) = encoded.split_once(PROJECT_ID_SEPARATOR) else {
            return TestId::project(encoded);
        };

        let file_end = after_project
            .find(|c: char| DESCRIBE_ID_SEPARATOR.contains(c) || TEST_ID_SEPARATOR.contains(c))
            .unwrap_or(after_project.len());
        let (file_name, rest) = after_project.split_at(file_end);

        let rest = rest.strip_suffix(TEST_ID_SEPARATOR).unwrap_or(rest);
        let (describes, test_id) = match rest.split_once(TEST_ID_SEPARATOR) {
            Some((describes, test_id)) => (describes, test_id),
            None => (rest, ""),
        };

        TestId {
            project_id: project_id.to_string(),
            file_name: non_empty(file_name),
            describe_ids: decode_describes(describes),
            test_id: non_empty(test_id),
        }
    }

    /// Every present field escaped so it matches only itself.
    pub fn to_escaped_regex(&self) -> PatternId {
        PatternId {
            project_id: escape_literal(&self.project_id),
            file_name: present(&self.file_name).map(escape_literal),
            describe_ids: self
                .describe_ids
                .as_ref()
                .map(|d| d.iter().map(|s| escape_literal(s)).collect()),
            test_id: present(&self.test_id).map(escape_literal),
        }
    }

    /// Like [`TestId::to_escaped_regex`], but describe and test titles are treated as
    /// parameterized templates. A placeholder only ever matches within its own title.
    pub fn to_placeholder_regex(&self) -> PatternId {
        PatternId {
            project_id: escape_literal(&self.project_id),
            file_name: present(&self.file_name).map(escape_literal),
            describe_ids: self
                .describe_ids
                .as_ref()
                .map(|d| d.iter().map(|s| translate_segment_placeholders(s)).collect()),
            test_id: present(&self.test_id).map(translate_segment_placeholders),
        }
    }
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

fn non_empty(segment: &str) -> Option<String> {
    (!segment.is_empty()).then(|| segment.to_string())
}

fn decode_describes(segment: &str) -> Option<Vec<String>> {
    if segment.is_empty() {
        return None;
    }
    let inner = segment
        .strip_prefix(DESCRIBE_ID_SEPARATOR)
        .and_then(|s| s.strip_suffix(DESCRIBE_ID_SEPARATOR))
        .unwrap_or(segment);
    let doubled = DESCRIBE_ID_SEPARATOR.repeat(2);
    Some(inner.split(doubled.as_str()).map(str::to_string).collect())
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for TestId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TestId::decode(s))
    }
}

impl From<&str> for TestId {
    fn from(s: &str) -> Self {
        TestId::decode(s)
    }
}

// ============================================================================
// PATTERN ID
// ============================================================================

/// A [`TestId`] whose fields are regex fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternId {
    pub project_id: PatternFragment,
    pub file_name: Option<PatternFragment>,
    pub describe_ids: Option<Vec<PatternFragment>>,
    pub test_id: Option<PatternFragment>,
}

impl PatternId {
    /// The encoded layout of [`TestId::encode`], as an unanchored pattern.
    pub fn encode(&self) -> PatternFragment {
        let mut out = self.project_id.clone();
        let Some(file_name) = &self.file_name else {
            return out;
        };
        out.push(&escape_literal(PROJECT_ID_SEPARATOR));
        out.push(file_name);
        if let Some(describes) = self.describe_ids.as_ref().filter(|d| !d.is_empty()) {
            for describe in describes {
                out.push(&wrap(describe, DESCRIBE_ID_SEPARATOR));
            }
        }
        if let Some(test_id) = &self.test_id {
            out.push(&wrap(test_id, TEST_ID_SEPARATOR));
        }
        out
    }

    /// Pattern for every id on the path from the first describe down to this id.
    ///
    /// Each describe after the first, and the test segment, is an optional tail nested
    /// inside the previous one, so `§A§§B§¶t¶` becomes `§A§(?:§B§(?:¶t¶)?)?`. Without a
    /// describe chain this is the same as [`PatternId::encode`].
    pub fn encode_ancestor_chain(&self) -> PatternFragment {
        let mut head = self.project_id.clone();
        let Some(file_name) = &self.file_name else {
            return head;
        };
        head.push(&escape_literal(PROJECT_ID_SEPARATOR));
        head.push(file_name);

        let describes = match self.describe_ids.as_deref() {
            Some(describes) if !describes.is_empty() => describes,
            _ => return self.encode(),
        };

        let mut tail = match &self.test_id {
            Some(test_id) => wrap(test_id, TEST_ID_SEPARATOR).optional(),
            None => PatternFragment::empty(),
        };
        for describe in describes[1..].iter().rev() {
            tail = wrap(describe, DESCRIBE_ID_SEPARATOR).concat(&tail).optional();
        }
        head.push(&wrap(&describes[0], DESCRIBE_ID_SEPARATOR));
        head.concat(&tail)
    }
}

fn wrap(inner: &PatternFragment, delimiter: &str) -> PatternFragment {
    let delimiter = escape_literal(delimiter);
    delimiter.concat(inner).concat(&delimiter)
}
