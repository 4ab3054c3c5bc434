use super::{log_report_stats, report_fetcher, storage_uploader, TaskOutcome};
use crate::config::{ConnectionStore, ReportToObjectStoreConfig};
use crate::error::Result;
use crate::output::{ObjectStoreSink, ObjectUploader};
use crate::reporting::{ReportFetcher, ReportingApi};
use crate::transform::Flattener;

/// Fetch a report and upload it as one NDJSON object
#[derive(Debug, Clone)]
pub struct ReportToObjectStore {
    config: ReportToObjectStoreConfig,
    flattener: Flattener,
}

impl ReportToObjectStore {
    pub fn new(config: ReportToObjectStoreConfig) -> Self {
        Self {
            config,
            flattener: Flattener::default(),
        }
    }

    pub fn config(&self) -> &ReportToObjectStoreConfig {
        &self.config
    }

    /// Resolve connections and run
    pub async fn execute(&self, connections: &ConnectionStore) -> Result<TaskOutcome> {
        self.config.report.validate()?;
        let fetcher = report_fetcher(&self.config.report, connections)?;
        let sink = ObjectStoreSink::new(storage_uploader(&self.config.storage, connections)?);
        self.run(&fetcher, &sink).await
    }

    /// Run against an explicit fetcher and sink
    pub async fn run<A, U>(
        &self,
        fetcher: &ReportFetcher<A>,
        sink: &ObjectStoreSink<U>,
    ) -> Result<TaskOutcome>
    where
        A: ReportingApi,
        U: ObjectUploader,
    {
        let report_config = &self.config.report;
        let report = fetcher.fetch(&report_config.query()).await?;
        log_report_stats(&report);

        let records =
            self.flattener
                .flatten(&report, &report_config.view_id, report_config.timestamp());

        let count = sink
            .write(&records, &self.config.bucket, &self.config.key)
            .await?;

        Ok(TaskOutcome {
            records: count,
            destination: format!("{}/{}", self.config.bucket, self.config.key),
        })
    }
}
