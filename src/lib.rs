// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Google Analytics Reporting Connector
//!
//! Pulls paginated Google Analytics reports and writes them either to object
//! storage as newline-delimited JSON or into a relational table.
//!
//! ## Features
//!
//! - **Complete reports**: every page of a batchGet report, merged in order
//! - **Flat records**: one record per row and date range, `ga:` prefixes removed
//! - **Object storage**: S3, GCS, Azure or a local directory via `object_store`
//! - **Tables**: DuckDB, or PostgreSQL / MySQL / SQLite attached through DuckDB
//! - **Account summaries**: the account → property → profile hierarchy
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ga_report_connector::config::{ConnectionStore, TaskDefinition};
//! use ga_report_connector::tasks::run_task;
//!
//! #[tokio::main]
//! async fn main() -> ga_report_connector::Result<()> {
//!     let connections = ConnectionStore::from_file("connections.yaml")?;
//!     let task = TaskDefinition::from_file("sessions_to_s3.yaml")?;
//!     let outcome = run_task(&task, &connections).await?;
//!     println!("{} records → {}", outcome.records, outcome.destination);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//!  ┌──────────┐   ┌────────────────┐   ┌───────────┐   ┌──────────────────┐
//!  │   Auth   │──▶│ Report Fetcher │──▶│ Flattener │──▶│ Object Store Sink│
//!  │ token/SA │   │ page → pause → │   │ row × set │   ├──────────────────┤
//!  └──────────┘   │ page → ...     │   └───────────┘   │ Table Sink       │
//!                 └────────────────┘                   └──────────────────┘
//!  Management API ─▶ account summaries ─▶ flatten ─▶ Object Store Sink
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the connector
pub mod error;

/// Common types and type aliases
pub mod types;

/// Connections and task definitions
pub mod config;

/// Bearer token and service-account authentication
pub mod auth;

/// HTTP client and page throttle
pub mod http;

/// Reporting and management API clients, report model, fetcher
pub mod reporting;

/// Report and account summary flattening
pub mod transform;

/// NDJSON serialization and object storage
pub mod output;

/// Relational table output via DuckDB
pub mod database;

/// End-to-end pipelines
pub mod tasks;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
