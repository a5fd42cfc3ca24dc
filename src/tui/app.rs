//! Main application logic for the terminal user interface.
//!
//! `App` owns the `TaskList` and plays the presentation controller: it turns
//! key presses into hierarchy operations, re-flattens the whole tree after each
//! change, and addresses rows only by their position in that flattened view.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tracing::debug;

use crate::fields::Kind;
use crate::hierarchy::TaskList;
use crate::task::{RowStyle, TaskId};
use crate::tui::{
    colors::{ACCENT, BACKGROUND, CLEAR_RED, DELETE_ORANGE, SUBTASK_BLUE},
    enums::AppState,
    input::InputField,
    utils::centered_rect,
};

/// A rendered row of the tree view.
#[derive(Debug, Clone)]
struct ViewRow {
    kind: Kind,
    label: String,
}

/// Main application state for the terminal user interface.
pub struct App {
    state: AppState,
    tasks: TaskList,
    style: RowStyle,
    rows: Vec<ViewRow>,
    list_state: ListState,
    entry: InputField,
    prompt: InputField,
    subtask_parent: Option<TaskId>,
    status_message: String,
}

impl App {
    /// Create an App with an empty task list.
    pub fn new(style: RowStyle) -> Self {
        App {
            state: AppState::TaskList,
            tasks: TaskList::new(),
            style,
            rows: Vec::new(),
            list_state: ListState::default(),
            entry: InputField::new(),
            prompt: InputField::new(),
            subtask_parent: None,
            status_message: String::new(),
        }
    }

    pub fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    /// The rendered rows currently on screen.
    pub fn rows(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.label.as_str()).collect()
    }

    pub fn selected(&self) -> Option<usize> {
        self.list_state.selected()
    }

    pub fn select(&mut self, index: Option<usize>) {
        self.list_state.select(index);
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    fn set_status_message(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }

    fn clear_status_message(&mut self) {
        self.status_message.clear();
    }

    /// Rebuild the whole view from the model and keep the selection in range.
    fn refresh_view(&mut self) {
        self.rows = self
            .tasks
            .flatten()
            .iter()
            .map(|entry| ViewRow {
                kind: entry.task.kind,
                label: entry.render(&self.style),
            })
            .collect();

        let selected = match (self.list_state.selected(), self.rows.len()) {
            (_, 0) => None,
            (Some(i), len) => Some(i.min(len - 1)),
            (None, _) => None,
        };
        self.list_state.select(selected);
    }

    /// Create a task from the input line. Empty input is ignored.
    fn add_task(&mut self) {
        let description = self.entry.take();
        if description.is_empty() {
            debug!("empty task description ignored");
            return;
        }
        self.tasks.create_task(&description);
        self.refresh_view();
        self.set_status_message(format!("Added task '{}'", description));
    }

    /// Open the subtask prompt for the selected row.
    fn begin_add_subtask(&mut self) {
        let parent = self
            .list_state
            .selected()
            .and_then(|i| self.tasks.resolve_by_flat_index(i))
            .map(|t| t.id);
        match parent {
            Some(id) => {
                self.subtask_parent = Some(id);
                self.prompt.clear();
                self.state = AppState::SubtaskPrompt;
            }
            None => self.set_status_message("Select a task first"),
        }
    }

    /// Attach the prompt text as a subtask of the remembered parent.
    fn submit_subtask(&mut self) {
        let description = self.prompt.take();
        self.state = AppState::TaskList;
        let Some(parent) = self.subtask_parent.take() else {
            return;
        };
        if description.is_empty() {
            debug!("empty subtask description ignored");
            return;
        }
        if self.tasks.add_subtask(parent, &description).is_some() {
            self.refresh_view();
            self.set_status_message(format!("Added subtask '{}'", description));
        }
    }

    /// Remove whatever occupies the selected row.
    fn delete_selected(&mut self) {
        let target = self
            .list_state
            .selected()
            .and_then(|i| self.tasks.resolve_by_flat_index(i))
            .map(|t| (t.id, t.description.clone()));
        let Some((id, description)) = target else {
            return;
        };
        if self.tasks.remove(id).is_some() {
            self.refresh_view();
            self.set_status_message(format!("Deleted '{}'", description));
        }
    }

    fn clear_all(&mut self) {
        self.tasks.clear_all();
        self.refresh_view();
        self.set_status_message("Cleared all tasks");
    }

    fn select_next(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let next = match self.list_state.selected() {
            Some(i) if i + 1 < self.rows.len() => i + 1,
            Some(i) => i,
            None => 0,
        };
        self.list_state.select(Some(next));
    }

    fn select_previous(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let prev = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(prev));
    }

    /// Dispatch a key press according to the current state.
    ///
    /// Returns true if the application should quit.
    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        if modifiers.contains(KeyModifiers::CONTROL) && key == KeyCode::Char('c') {
            return true;
        }
        self.clear_status_message();
        match self.state {
            AppState::TaskList => self.handle_task_list_input(key),
            AppState::EntryInput => {
                self.handle_entry_input(key);
                false
            }
            AppState::SubtaskPrompt => {
                self.handle_prompt_input(key);
                false
            }
            AppState::ConfirmClear => {
                self.handle_confirm_input(key);
                false
            }
            AppState::Help => {
                self.handle_help_input(key);
                false
            }
        }
    }

    fn handle_task_list_input(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up | KeyCode::Char('k') => self.select_previous(),
            KeyCode::Down | KeyCode::Char('j') => self.select_next(),
            KeyCode::Home => {
                if !self.rows.is_empty() {
                    self.list_state.select(Some(0));
                }
            }
            KeyCode::End => {
                if !self.rows.is_empty() {
                    self.list_state.select(Some(self.rows.len() - 1));
                }
            }
            KeyCode::Char('a') | KeyCode::Char('i') => self.state = AppState::EntryInput,
            KeyCode::Char('s') => self.begin_add_subtask(),
            KeyCode::Char('d') | KeyCode::Delete => self.delete_selected(),
            KeyCode::Char('C') => {
                if !self.tasks.is_empty() {
                    self.state = AppState::ConfirmClear;
                }
            }
            KeyCode::Char('h') | KeyCode::Char('?') => self.state = AppState::Help,
            _ => {}
        }
        false
    }

    fn handle_entry_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Enter => self.add_task(),
            KeyCode::Esc | KeyCode::Tab => self.state = AppState::TaskList,
            KeyCode::Char(c) => self.entry.handle_char(c),
            KeyCode::Backspace => self.entry.handle_backspace(),
            KeyCode::Delete => self.entry.handle_delete(),
            KeyCode::Left => self.entry.move_cursor_left(),
            KeyCode::Right => self.entry.move_cursor_right(),
            KeyCode::Home => self.entry.move_home(),
            KeyCode::End => self.entry.move_end(),
            _ => {}
        }
    }

    fn handle_prompt_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Enter => self.submit_subtask(),
            KeyCode::Esc => {
                self.prompt.clear();
                self.subtask_parent = None;
                self.state = AppState::TaskList;
            }
            KeyCode::Char(c) => self.prompt.handle_char(c),
            KeyCode::Backspace => self.prompt.handle_backspace(),
            KeyCode::Delete => self.prompt.handle_delete(),
            KeyCode::Left => self.prompt.move_cursor_left(),
            KeyCode::Right => self.prompt.move_cursor_right(),
            KeyCode::Home => self.prompt.move_home(),
            KeyCode::End => self.prompt.move_end(),
            _ => {}
        }
    }

    fn handle_confirm_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                self.clear_all();
                self.state = AppState::TaskList;
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                debug!("clear all declined");
                self.state = AppState::TaskList;
            }
            _ => {}
        }
    }

    fn handle_help_input(&mut self, key: KeyCode) {
        if matches!(key, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('h') | KeyCode::Char('?')) {
            self.state = AppState::TaskList;
        }
    }

    /// Poll for and handle keyboard events.
    ///
    /// Returns true if the application should quit.
    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(self.handle_key(key.code, key.modifiers));
                }
            }
        }
        Ok(false)
    }

    /// Render the input line with its "buttons" as a title.
    fn render_entry(&self, f: &mut Frame, area: Rect) {
        let focused = self.state == AppState::EntryInput;
        let border = if focused { ACCENT } else { Color::Gray };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(Line::from(vec![
                Span::styled(" New task ", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw("[Enter] Add Task  [s] Add Subtask "),
            ]));
        let inner = block.inner(area);
        f.render_widget(Paragraph::new(self.entry.value.as_str()).block(block), area);

        if focused {
            f.set_cursor_position((inner.x + self.entry.cursor as u16, inner.y));
        }
    }

    /// Render the flattened tree.
    fn render_task_list(&mut self, f: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = self
            .rows
            .iter()
            .map(|row| {
                let style = match row.kind {
                    Kind::Task => Style::default().fg(Color::White),
                    Kind::Subtask => Style::default().fg(SUBTASK_BLUE),
                };
                ListItem::new(row.label.as_str()).style(style)
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .style(Style::default().bg(BACKGROUND))
                    .title(format!(
                        "Tasks ({} rows, {} top-level) - Press 'h' for help",
                        self.rows.len(),
                        self.tasks.top_level_len()
                    )),
            )
            .highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        f.render_stateful_widget(list, area, &mut self.list_state);
    }

    /// Render the subtask description prompt over the list.
    fn render_prompt(&self, f: &mut Frame, area: Rect) {
        let parent = self
            .subtask_parent
            .and_then(|id| self.tasks.get(id))
            .map(|t| t.description.as_str())
            .unwrap_or("");

        let area = centered_rect(60, 20, area);
        f.render_widget(Clear, area);

        let block = Block::default()
            .title(format!("Enter subtask description for '{}'", parent))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(SUBTASK_BLUE));
        let inner = block.inner(area);
        f.render_widget(Paragraph::new(self.prompt.value.as_str()).block(block), area);
        f.set_cursor_position((inner.x + self.prompt.cursor as u16, inner.y));
    }

    /// Render the clear-all confirmation dialog.
    fn render_confirm(&self, f: &mut Frame, area: Rect) {
        let area = centered_rect(50, 30, area);
        f.render_widget(Clear, area);

        let block = Block::default()
            .title("Clear All Tasks")
            .borders(Borders::ALL)
            .style(Style::default().bg(CLEAR_RED).fg(Color::White));
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "Are you sure you want to clear all tasks?",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("{} rows will be removed.", self.rows.len())),
            Line::from(""),
            Line::from("Press 'y' to confirm, 'n' to cancel"),
        ];
        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let area = centered_rect(60, 60, area);
        f.render_widget(Clear, area);

        let keys = [
            ("a / i", "Type a new task, Enter to add"),
            ("s", "Add a subtask to the selected row"),
            ("d / Del", "Delete the selected row"),
            ("C", "Clear all tasks"),
            ("Up / Down", "Move selection"),
            ("Home / End", "First / last row"),
            ("h / ?", "Toggle this help"),
            ("q / Esc", "Quit"),
        ];
        let lines: Vec<Line> = keys
            .iter()
            .map(|(key, action)| {
                Line::from(vec![
                    Span::styled(format!("{:<12}", key), Style::default().fg(ACCENT)),
                    Span::raw(*action),
                ])
            })
            .collect();
        let paragraph = Paragraph::new(lines).block(Block::default().title("Help").borders(Borders::ALL));
        f.render_widget(paragraph, area);
    }

    /// Render the status bar at the bottom of the screen.
    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let (text, bg) = if !self.status_message.is_empty() {
            (self.status_message.clone(), ACCENT)
        } else {
            let hint = match self.state {
                AppState::TaskList => "a: add task  s: add subtask  d: delete  C: clear all  q: quit",
                AppState::EntryInput => "Enter: add task  Esc: back to list",
                AppState::SubtaskPrompt => "Enter: add subtask  Esc: cancel",
                AppState::ConfirmClear => "y: clear everything  n: keep tasks",
                AppState::Help => "Esc: close help",
            };
            let bg = if self.state == AppState::ConfirmClear {
                DELETE_ORANGE
            } else {
                BACKGROUND
            };
            (hint.to_string(), bg)
        };
        let status = Paragraph::new(text).style(Style::default().bg(bg).fg(Color::White));
        f.render_widget(status, area);
    }

    /// Main render function that dispatches to the view renderers.
    pub fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());

        self.render_entry(f, chunks[0]);
        self.render_task_list(f, chunks[1]);
        match self.state {
            AppState::SubtaskPrompt => self.render_prompt(f, chunks[1]),
            AppState::ConfirmClear => self.render_confirm(f, chunks[1]),
            AppState::Help => self.render_help(f, chunks[1]),
            AppState::TaskList | AppState::EntryInput => {}
        }
        self.render_status_bar(f, chunks[2]);
    }

    /// Main event loop for the TUI application.
    ///
    /// Every iteration draws the current view, then processes at most one key.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    fn press(app: &mut App, key: KeyCode) -> bool {
        app.handle_key(key, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn add_task(app: &mut App, description: &str) {
        press(app, KeyCode::Char('a'));
        type_text(app, description);
        press(app, KeyCode::Enter);
        press(app, KeyCode::Esc);
    }

    fn add_subtask(app: &mut App, row: usize, description: &str) {
        app.select(Some(row));
        press(app, KeyCode::Char('s'));
        type_text(app, description);
        press(app, KeyCode::Enter);
    }

    /// Row labels without the timestamp suffix.
    fn labels(app: &App) -> Vec<String> {
        app.rows()
            .iter()
            .map(|r| r.split(" (Added on ").next().unwrap_or(r).to_string())
            .collect()
    }

    fn render_to_string(app: &mut App, w: u16, h: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(w, h)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        let buf = terminal.backend().buffer().clone();
        buf.content
            .chunks(buf.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn typing_and_enter_adds_a_task() {
        let mut app = App::new(RowStyle::default());
        add_task(&mut app, "Buy milk");
        assert_eq!(labels(&app), vec!["Buy milk"]);
        assert_eq!(app.state(), AppState::TaskList);
    }

    #[test]
    fn empty_entry_is_ignored() {
        let mut app = App::new(RowStyle::default());
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "   ");
        press(&mut app, KeyCode::Enter);
        assert!(app.rows().is_empty());
        assert!(app.tasks().is_empty());
    }

    #[test]
    fn subtask_is_added_under_selected_row() {
        let mut app = App::new(RowStyle::default());
        add_task(&mut app, "A");
        add_task(&mut app, "B");
        add_subtask(&mut app, 0, "A.1");
        assert_eq!(labels(&app), vec!["A", "    [Subtask] A.1", "B"]);
        assert_eq!(app.state(), AppState::TaskList);
    }

    #[test]
    fn subtask_without_selection_only_reports() {
        let mut app = App::new(RowStyle::default());
        add_task(&mut app, "A");
        app.select(None);
        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.state(), AppState::TaskList);
        assert_eq!(app.status_message(), "Select a task first");
    }

    #[test]
    fn cancelled_or_empty_subtask_prompt_changes_nothing() {
        let mut app = App::new(RowStyle::default());
        add_task(&mut app, "A");
        add_subtask(&mut app, 0, "");
        app.select(Some(0));
        press(&mut app, KeyCode::Char('s'));
        type_text(&mut app, "draft");
        press(&mut app, KeyCode::Esc);
        assert_eq!(labels(&app), vec!["A"]);
    }

    #[test]
    fn delete_removes_selected_row_and_its_subtasks() {
        let mut app = App::new(RowStyle::default());
        add_task(&mut app, "A");
        add_task(&mut app, "B");
        add_subtask(&mut app, 0, "A.1");

        app.select(Some(1));
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(labels(&app), vec!["A", "B"]);

        app.select(Some(0));
        press(&mut app, KeyCode::Delete);
        assert_eq!(labels(&app), vec!["B"]);
        assert_eq!(app.selected(), Some(0));
    }

    #[test]
    fn delete_with_stale_selection_is_a_no_op() {
        let mut app = App::new(RowStyle::default());
        add_task(&mut app, "A");
        app.select(Some(7));
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(labels(&app), vec!["A"]);
    }

    #[test]
    fn clear_all_requires_confirmation() {
        let mut app = App::new(RowStyle::default());
        add_task(&mut app, "A");
        add_subtask(&mut app, 0, "A.1");

        press(&mut app, KeyCode::Char('C'));
        assert_eq!(app.state(), AppState::ConfirmClear);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.rows().len(), 2);

        press(&mut app, KeyCode::Char('C'));
        press(&mut app, KeyCode::Char('y'));
        assert!(app.rows().is_empty());
        assert!(app.tasks().flatten().is_empty());
        assert_eq!(app.selected(), None);
    }

    #[test]
    fn selection_stays_in_range() {
        let mut app = App::new(RowStyle::default());
        press(&mut app, KeyCode::Down);
        assert_eq!(app.selected(), None);

        add_task(&mut app, "A");
        add_task(&mut app, "B");
        press(&mut app, KeyCode::Down);
        assert_eq!(app.selected(), Some(0));
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.selected(), Some(1));
        press(&mut app, KeyCode::Home);
        assert_eq!(app.selected(), Some(0));
        press(&mut app, KeyCode::Up);
        assert_eq!(app.selected(), Some(0));

        press(&mut app, KeyCode::End);
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.selected(), Some(0));
    }

    #[test]
    fn quit_keys() {
        let mut app = App::new(RowStyle::default());
        assert!(press(&mut app, KeyCode::Char('q')));
        assert!(app.handle_key(KeyCode::Char('c'), KeyModifiers::CONTROL));

        // 'q' is text while typing
        press(&mut app, KeyCode::Char('a'));
        assert!(!press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn renders_tree_rows() {
        let mut app = App::new(RowStyle::default());
        add_task(&mut app, "Buy milk");
        add_subtask(&mut app, 0, "2% milk");

        let screen = render_to_string(&mut app, 100, 12);
        assert!(screen.contains("Buy milk (Added on "));
        assert!(screen.contains("    [Subtask] 2% milk (Added on "));
        assert!(screen.contains("Tasks (2 rows, 1 top-level)"));
    }

    #[test]
    fn renders_confirm_dialog() {
        let mut app = App::new(RowStyle::default());
        add_task(&mut app, "A");
        press(&mut app, KeyCode::Char('C'));

        let screen = render_to_string(&mut app, 100, 30);
        assert!(screen.contains("Clear All Tasks"));
        assert!(screen.contains("Press 'y' to confirm"));
    }
}
