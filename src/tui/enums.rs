//! Enumerations for TUI state management.

/// Which part of the interface currently receives key presses.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AppState {
    /// Moving through the tree view.
    TaskList,
    /// Typing a new task description in the input line.
    EntryInput,
    /// Typing a subtask description for the selected row.
    SubtaskPrompt,
    /// Asking whether to clear every task.
    ConfirmClear,
    Help,
}
