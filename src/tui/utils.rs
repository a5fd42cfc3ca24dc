//! Layout helpers shared by the overlays.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// A rectangle centred in `area`, sized as a percentage of it.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn popup_sits_inside_the_area() {
        let area = Rect::new(0, 0, 100, 40);
        let popup = centered_rect(50, 20, area);
        assert_eq!(popup.width, 50);
        assert_eq!(popup.height, 8);
        assert_eq!(popup.x, 25);
        assert_eq!(popup.y, 16);
    }
}
