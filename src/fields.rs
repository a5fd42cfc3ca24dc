//! Enumerations and field types for the task tree.
//!
//! This module defines the small structured types shared by the model and the
//! presentation layers: the entity kind tag and the output formats of the
//! headless controller.

use clap::ValueEnum;
use serde::Serialize;

/// Distinguishes top-level tasks from the subtasks nested beneath them.
///
/// Behaviour is identical for both; the tag only drives display formatting.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Kind {
    Task,
    Subtask,
}

impl Kind {
    /// Marker placed in front of the description when rendering a row.
    pub fn marker(self) -> &'static str {
        match self {
            Kind::Task => "",
            Kind::Subtask => "[Subtask] ",
        }
    }
}

/// Output format for the flattened view printed by `tt batch`.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_subtasks_carry_a_marker() {
        assert_eq!(Kind::Task.marker(), "");
        assert_eq!(Kind::Subtask.marker(), "[Subtask] ");
    }

    #[test]
    fn kind_serialises_in_kebab_case() {
        assert_eq!(serde_json::to_string(&Kind::Subtask).unwrap(), "\"subtask\"");
        assert_eq!(serde_json::to_string(&Kind::Task).unwrap(), "\"task\"");
    }
}
