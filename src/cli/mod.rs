//! CLI module
//!
//! Command-line interface for running the connector tasks.
//!
//! # Commands
//!
//! - `report-to-object-store` - Report → NDJSON object
//! - `report-to-table` - Report → database table
//! - `account-summaries-to-object-store` - Account hierarchy → NDJSON object
//! - `validate` - Check a task file without running it

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
