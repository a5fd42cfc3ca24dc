//! Command implementations for the CLI interface.
//!
//! Besides launching the terminal UI, the binary offers a headless controller:
//! `tt batch` reads one action per line, applies it to a fresh `TaskList` using
//! the same flat-index addressing the UI uses, and prints the resulting view.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use clap::Subcommand;
use clap_complete::{generate, Shell};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::fields::OutputFormat;
use crate::hierarchy::{FlatRow, TaskList};
use crate::task::RowStyle;
use crate::tui::run::run_tui;

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive UI (the default).
    Ui,

    /// Apply actions read line by line and print the resulting tree.
    ///
    /// Actions: `add <description>`, `sub <index> <description>`, `rm <index>`,
    /// `clear`, `show`. Indices are positions in the current flattened view.
    Batch {
        /// Read actions from this file instead of stdin.
        #[arg(long)]
        input: Option<PathBuf>,
        /// Output format of the printed views.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// One line of batch input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Add(String),
    Sub { index: i64, description: String },
    Remove(i64),
    Clear,
    Show,
}

/// Parse a single batch line. Blank lines and `#` comments yield `None`.
pub fn parse_action(line_no: usize, line: &str) -> Result<Option<Action>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    let action = match verb {
        "add" => Action::Add(rest.to_string()),
        "sub" => {
            let (index, description) = match rest.split_once(char::is_whitespace) {
                Some((index, description)) => (index, description.trim()),
                None => (rest, ""),
            };
            Action::Sub {
                index: parse_index(line_no, index)?,
                description: description.to_string(),
            }
        }
        "rm" => Action::Remove(parse_index(line_no, rest)?),
        "clear" => Action::Clear,
        "show" => Action::Show,
        other => return Err(Error::parse(line_no, format!("unknown action '{other}'"))),
    };
    Ok(Some(action))
}

fn parse_index(line_no: usize, s: &str) -> Result<i64> {
    s.parse::<i64>()
        .map_err(|_| Error::parse(line_no, format!("expected a row index, got '{s}'")))
}

/// Headless presentation controller over a `TaskList`.
pub struct Batch<W: Write> {
    list: TaskList,
    style: RowStyle,
    format: OutputFormat,
    out: W,
}

impl<W: Write> Batch<W> {
    pub fn new(style: RowStyle, format: OutputFormat, out: W) -> Self {
        Batch {
            list: TaskList::new(),
            style,
            format,
            out,
        }
    }

    pub fn list(&self) -> &TaskList {
        &self.list
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Apply one action. Empty descriptions and unknown rows are ignored.
    pub fn apply(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Add(description) => {
                if description.is_empty() {
                    debug!("empty task description ignored");
                } else {
                    self.list.create_task(&description);
                }
            }
            Action::Sub { index, description } => {
                let Some(parent) = self.list.resolve_signed(index).map(|t| t.id) else {
                    debug!(index, "no row at index, subtask ignored");
                    return Ok(());
                };
                if description.is_empty() {
                    debug!("empty subtask description ignored");
                } else {
                    self.list.add_subtask(parent, &description);
                }
            }
            Action::Remove(index) => match self.list.resolve_signed(index).map(|t| t.id) {
                Some(id) => {
                    self.list.remove(id);
                }
                None => debug!(index, "no row at index, remove ignored"),
            },
            Action::Clear => self.list.clear_all(),
            Action::Show => self.print_view()?,
        }
        Ok(())
    }

    /// Run every line of `reader`, then print the final view.
    pub fn run(&mut self, reader: impl BufRead) -> Result<()> {
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if let Some(action) = parse_action(i + 1, &line)? {
                self.apply(action)?;
            }
        }
        self.print_view()
    }

    /// Print the whole flattened view in the configured format.
    pub fn print_view(&mut self) -> Result<()> {
        let entries = self.list.flatten();
        match self.format {
            OutputFormat::Text => {
                for entry in &entries {
                    writeln!(self.out, "{}", entry.render(&self.style))?;
                }
            }
            OutputFormat::Json => {
                let rows: Vec<FlatRow> = entries.iter().map(|e| e.to_row(&self.style)).collect();
                serde_json::to_writer_pretty(&mut self.out, &rows)?;
                writeln!(self.out)?;
            }
        }
        Ok(())
    }
}

/// Launch the terminal user interface.
pub fn cmd_ui(style: RowStyle) -> Result<()> {
    run_tui(style)?;
    Ok(())
}

/// Run a batch of actions from a file or stdin and print to stdout.
pub fn cmd_batch(input: Option<PathBuf>, format: OutputFormat, style: RowStyle) -> Result<()> {
    let stdout = io::stdout();
    let mut batch = Batch::new(style, format, stdout.lock());
    match input {
        Some(path) => {
            info!(path = %path.display(), "reading batch actions");
            batch.run(BufReader::new(File::open(&path)?))?;
        }
        None => batch.run(io::stdin().lock())?,
    }
    batch.into_inner().flush()?;
    Ok(())
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut io::stdout());
}
