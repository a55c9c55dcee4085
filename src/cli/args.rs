//! Command-line arguments and subcommands for the testscope CLI.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::MatchMode;

#[derive(Debug, Parser)]
#[command(
    name = "testscope",
    version,
    about = "Select, filter and reconcile describe/it test trees."
)]
pub struct ScopeArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Encode an identifier from its parts.
    Encode {
        #[arg(long, required = true)]
        project: String,
        #[arg(long)]
        file: Option<String>,
        /// Describe titles, outermost first. Repeatable.
        #[arg(long = "describe")]
        describes: Vec<String>,
        #[arg(long)]
        test: Option<String>,
    },
    /// Decode an identifier into its parts.
    Decode {
        #[arg(required = true)]
        id: String,
    },
    /// Print the runner filter for a selection, or null to run everything.
    RunnerFilter {
        ids: Vec<String>,
        /// Print runner command line flags instead of the filter object.
        #[arg(long)]
        args: bool,
    },
    /// Narrow a JSON tree to a selection.
    Filter {
        /// Path to the tree, as emitted by the source parser.
        #[arg(long, required = true)]
        tree: PathBuf,
        /// YAML or JSON settings file.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Overrides the configured match mode.
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
        ids: Vec<String>,
    },
    /// Merge runner results into a project or workspace tree.
    Merge {
        #[arg(long, required = true)]
        tree: PathBuf,
        /// Path to the runner's per-file results.
        #[arg(long, required = true)]
        results: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Narrow the merged tree to these ids afterwards.
        #[arg(long = "select")]
        selection: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Literal,
    Regex,
}

impl From<ModeArg> for MatchMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Literal => MatchMode::Literal,
            ModeArg::Regex => MatchMode::Regex,
        }
    }
}
