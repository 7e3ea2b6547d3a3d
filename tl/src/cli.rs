//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use taskstore::{SortOrder, TaskId};

/// tasklist - live filtered to-do list
#[derive(Parser)]
#[command(
    name = "tl",
    about = "Reactive to-do list with live search, sorting and filtering",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Directory holding the task database and preferences
    #[arg(short, long = "data-dir", global = true, help = "Directory holding tasks.db and user_preferences.yml")]
    pub data_dir: Option<PathBuf>,

    /// Subcommand to execute (defaults to the interactive shell)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the filtered task list using the saved preferences
    List {
        /// Only tasks whose name contains this text (case-sensitive)
        #[arg(short, long, default_value = "")]
        search: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Add a task
    Add {
        /// Task name
        name: String,

        /// Mark the task important
        #[arg(short, long)]
        important: bool,
    },

    /// Edit a task's name or importance
    Edit {
        /// Task id
        id: TaskId,

        /// New name
        #[arg(short, long)]
        name: Option<String>,

        /// New importance
        #[arg(short, long)]
        important: Option<bool>,
    },

    /// Mark a task completed
    Check {
        /// Task id
        id: TaskId,
    },

    /// Mark a task not completed
    Uncheck {
        /// Task id
        id: TaskId,
    },

    /// Delete a task
    Delete {
        /// Task id
        id: TaskId,
    },

    /// Delete every completed task
    ClearCompleted,

    /// Set the sort order (by-name, by-date)
    Sort {
        /// Sort order
        #[arg(value_parser = parse_sort_order)]
        order: SortOrder,
    },

    /// Show or hide completed tasks
    HideCompleted {
        /// true to hide completed tasks
        #[arg(action = clap::ArgAction::Set)]
        hide: bool,
    },

    /// Print the saved preferences
    Prefs,

    /// Interactive shell with a live task list
    Shell {
        /// Initial search text
        #[arg(short, long, default_value = "")]
        search: String,
    },
}

fn parse_sort_order(s: &str) -> Result<SortOrder, String> {
    s.parse::<SortOrder>().map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sort() {
        let cli = Cli::try_parse_from(["tl", "sort", "by-name"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Sort {
                order: SortOrder::ByName
            })
        ));
    }

    #[test]
    fn test_parse_edit_with_global_flags() {
        let cli = Cli::try_parse_from([
            "tl",
            "edit",
            "3",
            "--name",
            "Call dad",
            "--important",
            "true",
            "--data-dir",
            "/tmp/tl",
        ])
        .unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/tl")));
        match cli.command {
            Some(Command::Edit { id, name, important }) => {
                assert_eq!(id, 3);
                assert_eq!(name.as_deref(), Some("Call dad"));
                assert_eq!(important, Some(true));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_no_subcommand_defaults_to_none() {
        let cli = Cli::try_parse_from(["tl"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_hide_completed_takes_value() {
        let cli = Cli::try_parse_from(["tl", "hide-completed", "false"]).unwrap();
        assert!(matches!(cli.command, Some(Command::HideCompleted { hide: false })));
    }
}
