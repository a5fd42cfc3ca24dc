//! Entry point for the `tt` binary: logging setup and command dispatch.

use std::fs::File;
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use task_tree::cli::Cli;
use task_tree::cmd::{cmd_batch, cmd_completions, cmd_ui, Commands};
use task_tree::task::RowStyle;

/// Environment variable holding the default log filter.
const LOG_ENV: &str = "TT_LOG";

/// Install the global subscriber.
///
/// Logs go to `--log-file` when given. Without one, the UI discards them so
/// the alternate screen stays intact, and other commands write to stderr.
fn init_logging(cli: &Cli, ui: bool) -> std::io::Result<()> {
    let filter = match cli.log_level.as_deref() {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    let writer = match (&cli.log_file, ui) {
        (Some(path), _) => BoxMakeWriter::new(Mutex::new(File::create(path)?)),
        (None, true) => BoxMakeWriter::new(std::io::sink),
        (None, false) => BoxMakeWriter::new(std::io::stderr),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(cli.log_file.is_none() && !ui)
        .init();
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let ui = matches!(cli.command, None | Some(Commands::Ui));

    if let Err(e) = init_logging(&cli, ui) {
        eprintln!("Failed to open log file: {e}");
        std::process::exit(1);
    }

    let style = RowStyle::with_indent(cli.indent);

    let result = match cli.command {
        None | Some(Commands::Ui) => cmd_ui(style),
        Some(Commands::Batch { input, format }) => cmd_batch(input, format, style),
        Some(Commands::Completions { shell }) => {
            cmd_completions(shell);
            Ok(())
        }
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
