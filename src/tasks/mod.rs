//! End-to-end pipelines
//!
//! Each task resolves its connections, fetches from the analytics APIs and
//! hands the flattened records to one sink:
//!
//! - `ReportToObjectStore`: report → flat records → NDJSON object
//! - `ReportToTable`: report → flat records → relational table
//! - `AccountSummariesToObjectStore`: account hierarchy → NDJSON object

mod account_summaries;
mod report_to_object_store;
mod report_to_table;

pub use account_summaries::AccountSummariesToObjectStore;
pub use report_to_object_store::ReportToObjectStore;
pub use report_to_table::ReportToTable;

use crate::auth::Credentials;
use crate::config::{ConnectionStore, ReportTaskConfig, TaskDefinition};
use crate::error::Result;
use crate::http::FixedPause;
use crate::output::{ObjectStoreUploader, StorageTarget};
use crate::reporting::{Report, ReportFetcher, ReportingClient};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// What a finished task produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    /// Records handed to the sink
    pub records: usize,
    /// Where they went, for logging
    pub destination: String,
}

/// Run a task definition to completion
pub async fn run_task(task: &TaskDefinition, connections: &ConnectionStore) -> Result<TaskOutcome> {
    info!("Starting task {}", task.kind());
    let outcome = match task {
        TaskDefinition::ReportToObjectStore(config) => {
            ReportToObjectStore::new(config.clone())
                .execute(connections)
                .await?
        }
        TaskDefinition::ReportToTable(config) => {
            ReportToTable::new(config.clone()).execute(connections).await?
        }
        TaskDefinition::AccountSummariesToObjectStore(config) => {
            AccountSummariesToObjectStore::new(config.clone())
                .execute(connections)
                .await?
        }
    };
    info!(
        "Task {} finished: {} records → {}",
        task.kind(),
        outcome.records,
        outcome.destination
    );
    Ok(outcome)
}

/// Credentials of the analytics connection
pub(crate) fn analytics_credentials(
    connections: &ConnectionStore,
    conn_id: &str,
    key_path: Option<&Path>,
) -> Result<Credentials> {
    let connection = connections.get(conn_id)?;
    Credentials::from_connection(&connection, key_path)
}

/// Authenticated fetcher for a report task
pub(crate) fn report_fetcher(
    config: &ReportTaskConfig,
    connections: &ConnectionStore,
) -> Result<ReportFetcher<ReportingClient>> {
    let key_path = config.key_path();
    let credentials = analytics_credentials(
        connections,
        &config.google_analytics_conn_id,
        key_path.as_deref(),
    )?;
    let client = ReportingClient::new(credentials, &config.endpoints)?;
    Ok(ReportFetcher::new(client).with_throttle(Arc::new(FixedPause::new(config.page_pause()))))
}

/// Uploader for a storage target, with its connection resolved
pub(crate) fn storage_uploader(
    target: &StorageTarget,
    connections: &ConnectionStore,
) -> Result<ObjectStoreUploader> {
    let connection = target.conn_id().map(|id| connections.get(id)).transpose()?;
    Ok(ObjectStoreUploader::new(target.clone(), connection))
}

/// Sampling and size figures reported with the data
pub(crate) fn log_report_stats(report: &Report) {
    info!("samples read {:?}", report.samples_read_counts);
    info!("sampling space {:?}", report.sampling_space_sizes);
    info!("totals {:?}", report.totals);
    info!("row count {}", report.row_count.unwrap_or(0));
    if report.is_data_golden == Some(false) {
        info!("report data is not golden and may change");
    }
}

#[cfg(test)]
mod tests;
