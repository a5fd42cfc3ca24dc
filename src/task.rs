//! Task data structure and related functionality.
//!
//! This module defines the `Task` entity that represents a single unit of work,
//! its identifier, and the row formatting used by every view of the tree.

use std::fmt;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::fields::Kind;

/// Default strftime pattern for the "Added on" part of a row.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";
/// Default number of spaces per depth level.
pub const DEFAULT_INDENT_WIDTH: usize = 4;

/// Stable handle for a task within a `TaskList`.
///
/// Ids are never reused, so a handle kept across a removal resolves to nothing
/// instead of to an unrelated task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A unit of work, either top-level or nested under a parent.
///
/// The parent's `children` vector is the only owner of a subtask; `parent` is a
/// plain id used for lookups and depth computation.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    pub created_at: DateTime<Local>,
    pub kind: Kind,
    pub parent: Option<TaskId>,
    pub children: Vec<Task>,
}

impl Task {
    /// Create a top-level task.
    pub fn new(id: TaskId, description: impl Into<String>, created_at: DateTime<Local>) -> Self {
        Task {
            id,
            description: description.into(),
            created_at,
            kind: Kind::Task,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Create a subtask owned by `parent`.
    pub fn new_subtask(
        id: TaskId,
        parent: TaskId,
        description: impl Into<String>,
        created_at: DateTime<Local>,
    ) -> Self {
        Task {
            kind: Kind::Subtask,
            parent: Some(parent),
            ..Task::new(id, description, created_at)
        }
    }

    pub fn is_subtask(&self) -> bool {
        self.kind == Kind::Subtask
    }

    /// Append a fully built child, fixing up its parent link.
    pub(crate) fn push_child(&mut self, mut child: Task) -> &Task {
        child.parent = Some(self.id);
        self.children.push(child);
        // just pushed
        &self.children[self.children.len() - 1]
    }

    /// Remove a direct child by id. No-op if it is not one of ours.
    pub fn remove_subtask(&mut self, id: TaskId) -> Option<Task> {
        let pos = self.children.iter().position(|c| c.id == id)?;
        Some(self.children.remove(pos))
    }

    /// Render this task as a row at the given depth.
    pub fn render(&self, depth: usize, style: &RowStyle) -> String {
        format!(
            "{}{}{} (Added on {})",
            " ".repeat(style.indent_width * depth),
            self.kind.marker(),
            self.description,
            self.created_at.format(&style.timestamp_format)
        )
    }
}

/// Row formatting options shared by the TUI and the batch printer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowStyle {
    pub indent_width: usize,
    pub timestamp_format: String,
}

impl Default for RowStyle {
    fn default() -> Self {
        RowStyle {
            indent_width: DEFAULT_INDENT_WIDTH,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}

impl RowStyle {
    pub fn with_indent(indent_width: usize) -> Self {
        RowStyle {
            indent_width,
            ..RowStyle::default()
        }
    }
}
