//! Testscope: selecting, filtering and reconciling describe/it style test trees.
//!
//! Tests are addressed by encoded ids whose string prefixes mirror the
//! project → file → describe → test hierarchy (see [`id`]). A selection of ids can be
//! turned into runner flags ([`runner_filter`]), used to prune a parsed tree
//! ([`select`]), and, after the run, reconciled with the titles the runner actually
//! reported ([`reconcile`]).

pub use crate::config::{MatchMode, PathNormalization, Settings};
pub use crate::diagnostics::{ErrorType, ScopeError};
pub use crate::id::{PatternId, TestId, RUN_ALL_ID};
pub use crate::pattern::{
    escape_literal, translate_placeholders, translate_segment_placeholders, PatternFragment,
};
pub use crate::plan::{plan_project_runs, ProjectRun};
pub use crate::reconcile::{merge_runtime_results, merge_workspace_results, AssertionResult, FileResults};
pub use crate::runner_filter::{build_test_filter, TestFilter};
pub use crate::select::{filter_tree, filter_tree_with, Selection};
pub use crate::tree::Node;

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod id;
pub mod pattern;
pub mod plan;
pub mod reconcile;
pub mod runner_filter;
pub mod select;
pub mod tree;
pub mod visit;
