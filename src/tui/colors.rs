//! Color constants for the terminal user interface.

use ratatui::style::Color;

/// Input line focus and key hints.
pub const ACCENT: Color = Color::Rgb(159, 104, 243);
/// Subtask rows.
pub const SUBTASK_BLUE: Color = Color::Rgb(127, 168, 243);
/// Delete confirmation and errors.
pub const DELETE_ORANGE: Color = Color::Rgb(228, 128, 100);
/// Clear-all confirmation background.
pub const CLEAR_RED: Color = Color::Rgb(218, 27, 86);
/// Window background.
pub const BACKGROUND: Color = Color::Rgb(48, 50, 63);
