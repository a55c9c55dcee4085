//! Splitting a workspace selection into per-project runs.
//!
//! The runner is invoked once per project. A [`ProjectRun`] bundles the pure steps
//! around that invocation: the tree scheduled before the run, the filter passed to the
//! runner, and the reconciled tree once results come back.

use crate::config::Settings;
use crate::id::{selects_everything, TestId, RUN_ALL_ID};
use crate::reconcile::{merge_runtime_results, FileResults};
use crate::runner_filter::{build_test_filter, TestFilter};
use crate::select::{filter_project, Selection};
use crate::tree::{ProjectRootNode, WorkspaceRootNode};
use crate::ScopeError;

/// One project and the selected ids that belong to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRun {
    pub project: ProjectRootNode,
    pub selection: Vec<String>,
}

/// Groups `selection` by project, in workspace order.
///
/// Selecting the workspace root runs every project with the root id; projects that no
/// selected id names are left out.
#[tracing::instrument(level = "debug", skip_all, fields(projects = workspace.projects.len()))]
pub fn plan_project_runs<S: AsRef<str>>(
    workspace: &WorkspaceRootNode,
    selection: &[S],
) -> Vec<ProjectRun> {
    if selection.iter().any(|s| s.as_ref() == RUN_ALL_ID) {
        return workspace
            .projects
            .iter()
            .map(|project| ProjectRun {
                project: project.clone(),
                selection: vec![RUN_ALL_ID.to_string()],
            })
            .collect();
    }

    let ids: Vec<TestId> = selection.iter().map(|s| TestId::decode(s.as_ref())).collect();
    let runs: Vec<ProjectRun> = workspace
        .projects
        .iter()
        .filter_map(|project| {
            let selection: Vec<String> = ids
                .iter()
                .filter(|id| id.project_id == project.id)
                .map(TestId::encode)
                .collect();
            (!selection.is_empty()).then(|| ProjectRun {
                project: project.clone(),
                selection,
            })
        })
        .collect();
    tracing::debug!(runs = runs.len(), "planned project runs");
    runs
}

impl ProjectRun {
    /// Filter for the runner, `None` meaning the whole project.
    pub fn test_filter(&self) -> Option<TestFilter> {
        build_test_filter(&self.selection)
    }

    /// The static tree narrowed to what this run will execute.
    pub fn scheduled_tree(&self) -> ProjectRootNode {
        filter_project(&self.project, &Selection::literal(&self.selection))
    }

    /// Merges the runner's results and narrows the merged tree to the selection again.
    ///
    /// Runtime-discovered tests are only kept when they belong to the selection, which
    /// for parameterized titles needs the regex match mode.
    pub fn reconcile(
        &self,
        results: &[FileResults],
        settings: &Settings,
    ) -> Result<ProjectRootNode, ScopeError> {
        let merged = merge_runtime_results(&self.project, results, settings)?;
        if selects_everything(&self.selection) {
            return Ok(merged);
        }
        let selection = Selection::new(&self.selection, settings.match_mode)?;
        Ok(filter_project(&merged, &selection))
    }
}
