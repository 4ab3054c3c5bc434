//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Google Analytics reporting connector
#[derive(Parser, Debug)]
#[command(name = "ga-report-connector")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Connection store file (YAML or JSON); `GA_CONN_<ID>` variables are
    /// consulted for ids it does not define
    #[arg(long, global = true)]
    pub connections: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a report and upload it as newline-delimited JSON
    ReportToObjectStore {
        /// Task definition file (YAML or JSON)
        #[arg(short, long)]
        task: PathBuf,
    },

    /// Fetch a report and write it into a database table
    ReportToTable {
        /// Task definition file (YAML or JSON)
        #[arg(short, long)]
        task: PathBuf,
    },

    /// Upload the account summaries hierarchy as newline-delimited JSON
    AccountSummariesToObjectStore {
        /// Task definition file (YAML or JSON)
        #[arg(short, long)]
        task: PathBuf,
    },

    /// Load and validate a task definition without running it
    Validate {
        /// Task definition file (YAML or JSON)
        #[arg(short, long)]
        task: PathBuf,
    },
}

impl Commands {
    pub fn task_path(&self) -> &PathBuf {
        match self {
            Commands::ReportToObjectStore { task }
            | Commands::ReportToTable { task }
            | Commands::AccountSummariesToObjectStore { task }
            | Commands::Validate { task } => task,
        }
    }

    /// Task kind the command runs, None for `validate`
    pub fn expected_kind(&self) -> Option<&'static str> {
        match self {
            Commands::ReportToObjectStore { .. } => Some("report_to_object_store"),
            Commands::ReportToTable { .. } => Some("report_to_table"),
            Commands::AccountSummariesToObjectStore { .. } => {
                Some("account_summaries_to_object_store")
            }
            Commands::Validate { .. } => None,
        }
    }
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_report_to_table() {
        let cli = Cli::try_parse_from([
            "ga-report-connector",
            "--connections",
            "conns.yaml",
            "-v",
            "report-to-table",
            "--task",
            "task.yaml",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.connections, Some(PathBuf::from("conns.yaml")));
        assert_eq!(cli.command.task_path(), &PathBuf::from("task.yaml"));
        assert_eq!(cli.command.expected_kind(), Some("report_to_table"));
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn test_parse_validate() {
        let cli = Cli::try_parse_from(["ga-report-connector", "validate", "-t", "t.yml", "-f", "pretty"])
            .unwrap();
        assert!(matches!(cli.command, Commands::Validate { .. }));
        assert_eq!(cli.command.expected_kind(), None);
        assert_eq!(cli.format, OutputFormat::Pretty);
    }

    #[test]
    fn test_task_is_required() {
        assert!(Cli::try_parse_from(["ga-report-connector", "report-to-object-store"]).is_err());
    }
}
