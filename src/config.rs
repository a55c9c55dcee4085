//! Settings shared by the library entry points and the CLI.
//!
//! ```yaml
//! matchMode: regex            # literal | regex
//! pathNormalization: driveLetter   # exact | driveLetter | caseInsensitive
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ScopeError;

/// How selected ids are compared with node ids while pruning a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchMode {
    /// Plain string prefix and equality checks.
    Literal,
    /// Prefix checks first, then placeholder-aware patterns for describes and tests.
    #[default]
    Regex,
}

/// How file paths from runner results are compared with file nodes.
///
/// The same normalization is applied to both sides of every comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PathNormalization {
    /// Byte-for-byte comparison.
    Exact,
    /// Lower-cases a leading Windows drive letter (`C:\` and `c:\` compare equal).
    #[default]
    DriveLetter,
    /// Lower-cases the whole path, for case-insensitive file systems.
    CaseInsensitive,
}

impl PathNormalization {
    pub fn normalize(self, path: &str) -> String {
        match self {
            PathNormalization::Exact => path.to_string(),
            PathNormalization::DriveLetter => lower_case_drive_letter(path),
            PathNormalization::CaseInsensitive => path.to_lowercase(),
        }
    }

    pub fn same_path(self, a: &str, b: &str) -> bool {
        self.normalize(a) == self.normalize(b)
    }
}

fn lower_case_drive_letter(path: &str) -> String {
    let mut chars = path.chars();
    match (chars.next(), chars.next()) {
        (Some(drive), Some(':')) if drive.is_ascii_alphabetic() => {
            let mut out = String::with_capacity(path.len());
            out.push(drive.to_ascii_lowercase());
            out.push_str(&path[drive.len_utf8()..]);
            out
        }
        _ => path.to_string(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Settings {
    /// Mode used when re-filtering a tree after runtime results were merged.
    pub match_mode: MatchMode,
    pub path_normalization: PathNormalization,
}

impl Settings {
    /// Parses YAML settings. JSON is accepted too, being a subset of YAML.
    pub fn from_yaml_str(source: &str) -> Result<Self, ScopeError> {
        if source.trim().is_empty() {
            return Ok(Settings::default());
        }
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ScopeError> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| ScopeError::from(e).with_context(path.display()))?;
        Self::from_yaml_str(&source).map_err(|e| e.with_context(path.display()))
    }
}
