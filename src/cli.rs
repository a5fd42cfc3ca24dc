use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;
use crate::task::DEFAULT_INDENT_WIDTH;

/// Interactive task and subtask manager.
/// Runs the terminal UI unless a subcommand is given. Nothing is saved to disk.
#[derive(Parser)]
#[command(name = "tt", version, about = "Task and subtask tree manager")]
pub struct Cli {
    /// Spaces of indentation per nesting level in the tree view.
    #[arg(long, global = true, default_value_t = DEFAULT_INDENT_WIDTH)]
    pub indent: usize,

    /// Write logs to this file instead of stderr (the UI discards them otherwise).
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "task_tree=trace". Overrides TT_LOG.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
