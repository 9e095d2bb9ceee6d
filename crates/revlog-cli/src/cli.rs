use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "revlog",
    about = "revlog: structured version history and revert for content aggregates",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the structural delta between two JSON documents
    Diff(DiffArgs),
    /// Apply (or unapply) a delta to a JSON document
    Patch(PatchArgs),
    /// List the persisted revisions of an aggregate
    History(HistoryArgs),
    /// Replay a scripted editing session against an in-memory store
    Session(SessionArgs),
}

#[derive(Args)]
pub struct DiffArgs {
    /// Older version of the document
    pub old: PathBuf,
    /// Newer version of the document
    pub new: PathBuf,
}

#[derive(Args)]
pub struct PatchArgs {
    /// Document to patch
    pub value: PathBuf,
    /// Delta file, as printed by `revlog diff --format json`
    pub delta: PathBuf,
    /// Move the document backwards along the delta
    #[arg(short, long)]
    pub reverse: bool,
}

#[derive(Args)]
pub struct HistoryArgs {
    /// Aggregate root id
    pub aggregate: String,
    /// Directory holding revision set files
    #[arg(long)]
    pub log_dir: PathBuf,
    /// Show at most this many entries
    #[arg(short = 'n', long, default_value = "100")]
    pub limit: usize,
}

#[derive(Args)]
pub struct SessionArgs {
    /// JSON script of editing, undo, and reset steps
    pub script: PathBuf,
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
