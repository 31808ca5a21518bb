// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `ganttline`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ganttline",
    version,
    about = "Edit a group's Gantt schedule; dependent tasks follow automatically.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Ganttline.toml` in the current working directory, or the
    /// built-in defaults if that file does not exist.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<String>,

    /// Group whose schedule to work on.
    #[arg(long, short, value_name = "GROUP", default_value = "default", global = true)]
    pub group: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `GANTTLINE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Compute and print the result of an edit without saving it.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the group's tasks and links.
    Show,

    /// Create a task.
    Add {
        /// Task id (a fresh ULID if omitted).
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        text: String,
        /// Start, e.g. `2025-01-01T08:00`.
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        /// Category tag; repeat for several.
        #[arg(long = "specialty", value_name = "TAG")]
        specialty: Vec<String>,
        /// Completion in `[0, 1]`.
        #[arg(long)]
        progress: Option<f64>,
        /// Task that should start when this one finishes.
        #[arg(long, value_name = "TASK")]
        dependent: Option<String>,
    },

    /// Change fields of a task; its dependents are rescheduled.
    Edit {
        id: String,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        progress: Option<f64>,
        /// Replace the tags; repeat for several.
        #[arg(long = "specialty", value_name = "TAG")]
        specialty: Vec<String>,
    },

    /// Shift a task keeping its duration, e.g. `--by 2h`, `--by -1d30m`.
    Move {
        id: String,
        #[arg(long, allow_hyphen_values = true, value_name = "SHIFT")]
        by: String,
    },

    /// Delete a task and every link touching it.
    Delete { id: String },

    /// Link two tasks; the gap is taken from their current schedules.
    Link {
        source: String,
        target: String,
        /// FS, SS, FF or SF (or the chart codes 0-3).
        #[arg(long = "type", default_value = "FS", value_name = "TYPE")]
        kind: String,
        /// Link id (a fresh ULID if omitted).
        #[arg(long)]
        id: Option<String>,
    },

    /// Remove a link.
    Unlink { id: String },

    /// Set the single dependent of a task, or clear it when omitted.
    Depend { source: String, target: Option<String> },

    /// Create tasks from a Trello board's cards (the JSON of `GET /1/boards/{id}/cards`).
    ///
    /// Cards whose id is already a task are skipped.
    Import {
        #[arg(value_name = "CARDS_JSON")]
        file: String,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
