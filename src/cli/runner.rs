//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::{ConnectionStore, TaskDefinition};
use crate::error::{Error, Result};
use crate::tasks::{run_task, TaskOutcome};
use serde_json::json;
use std::time::Instant;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let task = self.load_task()?;

        if let Commands::Validate { .. } = self.cli.command {
            self.emit(json!({"type": "VALID", "task": task.kind()}), || {
                format!("{} task is valid", task.kind())
            });
            return Ok(());
        }

        let connections = self.load_connections()?;
        let start = Instant::now();
        let outcome = run_task(&task, &connections).await?;
        self.report(&task, &outcome, start.elapsed().as_millis());
        Ok(())
    }

    /// Load the task file and check it matches the command
    fn load_task(&self) -> Result<TaskDefinition> {
        let task = TaskDefinition::from_file(self.cli.command.task_path())?;
        match self.cli.command.expected_kind() {
            Some(expected) if expected != task.kind() => Err(Error::config(format!(
                "Task file defines '{}' but the command runs '{expected}'",
                task.kind()
            ))),
            _ => Ok(task),
        }
    }

    fn load_connections(&self) -> Result<ConnectionStore> {
        match &self.cli.connections {
            Some(path) => ConnectionStore::from_file(path),
            None => Ok(ConnectionStore::new()),
        }
    }

    fn report(&self, task: &TaskDefinition, outcome: &TaskOutcome, elapsed_ms: u128) {
        self.emit(
            json!({
                "type": "RESULT",
                "task": task.kind(),
                "records": outcome.records,
                "destination": outcome.destination,
                "elapsed_ms": elapsed_ms,
            }),
            || {
                format!(
                    "{}: {} records → {} ({elapsed_ms} ms)",
                    task.kind(),
                    outcome.records,
                    outcome.destination
                )
            },
        );
    }

    fn emit(&self, message: serde_json::Value, pretty: impl FnOnce() -> String) {
        match self.cli.format {
            OutputFormat::Json => println!("{message}"),
            OutputFormat::Pretty => println!("{}", pretty()),
        }
    }
}
