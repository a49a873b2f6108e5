//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Count cells in single-cell lineage trees whose fluorescence intensity exceeds a threshold
#[derive(Parser, Debug)]
#[command(name = "lineage-fluor")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output on stderr, repeat for more (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub debug: u8,

    /// Project directory holding a local .lineage-fluor.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Options shared by commands that evaluate the threshold.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ThresholdArgs {
    /// Intensity threshold, cells strictly above it are counted
    #[arg(short, long, allow_negative_numbers = true)]
    pub threshold: Option<f64>,

    /// Fluorescence channel name
    #[arg(short, long)]
    pub channel: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Count cells whose channel intensity exceeds the threshold
    Count {
        /// Tree document (default: tree_file from config)
        #[arg(value_hint = ValueHint::FilePath)]
        tree: Option<PathBuf>,
        /// Metadata document (default: meta_file from config)
        #[arg(value_hint = ValueHint::FilePath)]
        meta: Option<PathBuf>,
        #[command(flatten)]
        threshold: ThresholdArgs,
        /// Count phylogenies in parallel
        #[arg(long)]
        parallel: bool,
        /// Also print one line per phylogeny
        #[arg(long)]
        per_tree: bool,
    },

    /// Show lineages as trees with channel intensities
    Tree {
        /// Tree document
        #[arg(value_hint = ValueHint::FilePath)]
        tree: PathBuf,
        /// Metadata document
        #[arg(value_hint = ValueHint::FilePath)]
        meta: PathBuf,
        #[command(flatten)]
        threshold: ThresholdArgs,
    },

    /// List fluorescence channels declared in a metadata document
    Channels {
        /// Metadata document
        #[arg(value_hint = ValueHint::FilePath)]
        meta: PathBuf,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show config paths
    Path,
}
