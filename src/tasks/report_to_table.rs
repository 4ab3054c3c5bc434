use super::{log_report_stats, report_fetcher, TaskOutcome};
use crate::config::{ConnectionStore, ReportToTableConfig};
use crate::database::{write_records, FrameWriter, TableOptions, TableWriter};
use crate::error::Result;
use crate::reporting::{Report, ReportFetcher, ReportingApi};
use crate::transform::Flattener;
use tracing::debug;

/// Fetch a report and bulk-write it into a table
#[derive(Debug, Clone)]
pub struct ReportToTable {
    config: ReportToTableConfig,
    flattener: Flattener,
}

impl ReportToTable {
    pub fn new(config: ReportToTableConfig) -> Self {
        Self {
            config,
            flattener: Flattener::default(),
        }
    }

    pub fn config(&self) -> &ReportToTableConfig {
        &self.config
    }

    /// Resolve connections, open the database and run
    pub async fn execute(&self, connections: &ConnectionStore) -> Result<TaskOutcome> {
        self.config.report.validate()?;
        let fetcher = report_fetcher(&self.config.report, connections)?;
        let db_connection = self
            .config
            .database
            .conn_id()
            .map(|id| connections.get(id))
            .transpose()?;
        let mut writer = TableWriter::open(&self.config.database, db_connection.as_ref())?;
        self.run(&fetcher, &mut writer).await
    }

    /// Run against an explicit fetcher and table writer
    pub async fn run<A, W>(&self, fetcher: &ReportFetcher<A>, writer: &mut W) -> Result<TaskOutcome>
    where
        A: ReportingApi,
        W: FrameWriter,
    {
        let report_config = &self.config.report;
        let report = fetcher.fetch(&report_config.query()).await?;
        log_report_stats(&report);

        let records =
            self.flattener
                .flatten(&report, &report_config.view_id, report_config.timestamp());
        let options = self.table_options(&report);

        let count = write_records(writer, &records, &options)?;

        Ok(TaskOutcome {
            records: count,
            destination: match &options.schema {
                Some(schema) => format!("{schema}.{}", options.table),
                None => options.table.clone(),
            },
        })
    }

    /// Destination options with metric-derived column types merged in
    fn table_options(&self, report: &Report) -> TableOptions {
        let mut options = self.config.destination.clone();
        for column in self.flattener.column_types(report) {
            debug!("column {} maps to {}", column.name, column.sql_type);
            if self.config.typed_columns {
                options
                    .dtypes
                    .entry(column.name)
                    .or_insert_with(|| column.sql_type.to_string());
            }
        }
        options
    }
}
