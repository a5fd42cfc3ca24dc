//! # tt - Task Tree
//!
//! An interactive manager for a two-level list of tasks and subtasks.
//!
//! ## Key Features
//!
//! - **Task Hierarchy**: top-level tasks, each with an ordered list of subtasks
//! - **Live Tree View**: every change re-renders the whole tree, subtasks
//!   indented beneath their task and tagged `[Subtask]`
//! - **Row Addressing**: actions target the row you select, resolved through the
//!   same pre-order walk that produced the view
//! - **Headless Mode**: `tt batch` drives the same operations from a script
//!
//! ## Quick Start
//!
//! ```bash
//! # Launch the terminal UI
//! tt
//!
//! # Build a tree from a script and print it
//! printf 'add Buy milk\nsub 0 2%% milk\n' | tt batch
//! ```
//!
//! Nothing is written to disk: the list lives for the length of the session.
//!
//! ## Key Commands
//!
//! - `tt` / `tt ui` - Launch the terminal UI
//! - `tt batch` - Apply `add`, `sub`, `rm`, `clear` and `show` lines and print the tree
//! - `tt completions <shell>` - Print shell completions
//!
//! Logging goes through `tracing`; set `TT_LOG` (or `--log-level`) to a filter
//! such as `debug` and `--log-file` to capture it while the UI is running.

pub mod cli;
pub mod cmd;
pub mod error;
pub mod fields;
pub mod hierarchy;
pub mod task;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod run;
    pub mod utils;
}
