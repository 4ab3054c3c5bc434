use super::{analytics_credentials, storage_uploader, TaskOutcome};
use crate::config::{AccountSummariesConfig, ConnectionStore};
use crate::error::Result;
use crate::output::{ObjectStoreSink, ObjectUploader};
use crate::reporting::ManagementClient;
use crate::transform::flatten_account_summaries;
use tracing::info;

/// Upload the account → property → profile hierarchy as NDJSON
#[derive(Debug, Clone)]
pub struct AccountSummariesToObjectStore {
    config: AccountSummariesConfig,
}

impl AccountSummariesToObjectStore {
    pub fn new(config: AccountSummariesConfig) -> Self {
        Self { config }
    }

    pub async fn execute(&self, connections: &ConnectionStore) -> Result<TaskOutcome> {
        let key_path = self.config.key_path();
        let credentials = analytics_credentials(
            connections,
            &self.config.google_analytics_conn_id,
            key_path.as_deref(),
        )?;
        let client = ManagementClient::new(credentials, &self.config.endpoints)?;
        let sink = ObjectStoreSink::new(storage_uploader(&self.config.storage, connections)?);
        self.run(&client, &sink).await
    }

    pub async fn run<U: ObjectUploader>(
        &self,
        client: &ManagementClient,
        sink: &ObjectStoreSink<U>,
    ) -> Result<TaskOutcome> {
        let summaries = client.account_summaries().await?;
        info!("Fetched {} account summaries", summaries.items.len());

        let records = flatten_account_summaries(&summaries, &self.config.brand, &self.config.space);
        let count = sink
            .write(&records, &self.config.bucket, &self.config.key)
            .await?;

        Ok(TaskOutcome {
            records: count,
            destination: format!("{}/{}", self.config.bucket, self.config.key),
        })
    }
}
