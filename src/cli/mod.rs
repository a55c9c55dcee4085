//! The testscope command-line interface.
//!
//! Every subcommand is a thin wrapper over one library operation and prints its result
//! as JSON on stdout. Errors are returned as miette reports.

use std::path::Path;

use clap::Parser;

use crate::cli::args::{Command, ScopeArgs};
use crate::cli::output::{init_tracing, load_settings, print_json, read_json};
use crate::config::Settings;
use crate::err_msg;
use crate::id::TestId;
use crate::reconcile::{merge_runtime_results, merge_workspace_results, FileResults};
use crate::runner_filter::build_test_filter;
use crate::select::{filter_tree, Selection};
use crate::tree::Node;
use crate::visit::TreeStats;
use crate::ScopeError;

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() -> miette::Result<()> {
    init_tracing();
    let args = ScopeArgs::parse();
    dispatch(args.command)?;
    Ok(())
}

fn dispatch(command: Command) -> Result<(), ScopeError> {
    match command {
        Command::Encode {
            project,
            file,
            describes,
            test,
        } => {
            let mut id = TestId::project(project);
            if let Some(file) = file {
                id = id.with_file(file);
            }
            for describe in describes {
                id = id.with_describe(describe);
            }
            if let Some(test) = test {
                id = id.with_test(test);
            }
            print_json(&id.encode())
        }
        Command::Decode { id } => print_json(&TestId::decode(&id)),
        Command::RunnerFilter { ids, args } => {
            let filter = build_test_filter(&ids);
            if args {
                let flags = filter.map(|f| f.runner_args()).unwrap_or_default();
                print_json(&flags)
            } else {
                print_json(&filter)
            }
        }
        Command::Filter {
            tree,
            config,
            mode,
            ids,
        } => {
            let settings = load_settings(config.as_deref())?;
            let mode = mode.map(Into::into).unwrap_or(settings.match_mode);
            let node: Node = read_json(&tree)?;
            let selection = Selection::new(&ids, mode)?;
            print_json(&filter_tree(&node, &selection))
        }
        Command::Merge {
            tree,
            results,
            config,
            selection,
        } => {
            let settings = load_settings(config.as_deref())?;
            let node: Node = read_json(&tree)?;
            let results: Vec<FileResults> = read_json(&results)?;
            let merged = merge_node(&node, &results, &settings, &tree)?;
            tracing::debug!(stats = ?TreeStats::of(&merged), "merged runner results");
            let selection = Selection::new(&selection, settings.match_mode)?;
            print_json(&filter_tree(&merged, &selection))
        }
    }
}

fn merge_node(
    node: &Node,
    results: &[FileResults],
    settings: &Settings,
    path: &Path,
) -> Result<Node, ScopeError> {
    match node {
        Node::WorkspaceRoot(workspace) => {
            Ok(Node::WorkspaceRoot(merge_workspace_results(workspace, results, settings)?))
        }
        Node::ProjectRoot(project) => {
            Ok(Node::ProjectRoot(merge_runtime_results(project, results, settings)?))
        }
        other => Err(err_msg!(
            Contract,
            "{}: results can only be merged into a workspace or project root, got a {} node",
            path.display(),
            other.kind()
        )),
    }
}
