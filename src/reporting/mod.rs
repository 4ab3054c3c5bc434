//! Reporting module
//!
//! Everything that talks to the analytics APIs:
//! - `ReportQuery` and the batchGet request body built from it
//! - Wire types and the parsed `Report` model
//! - `ReportFetcher`, which pages through a report until exhaustion
//! - `ManagementClient` for account summaries, v3 reports and data uploads

mod client;
mod fetcher;
mod model;
mod query;

pub use client::{
    AccountSummaries, AccountSummary, ApiEndpoints, ManagementClient, ProfileSummary,
    ReportingApi, ReportingClient, WebPropertySummary,
};
pub use fetcher::ReportFetcher;
pub use model::{
    BatchGetResponse, ColumnHeader, DimensionValue, MetricHeader, MetricValue, RawColumnHeader,
    RawDateRangeValues, RawMetricHeader, RawMetricHeaderEntry, RawReport, RawReportData, RawRow,
    Report, Row, UNSPECIFIED_METRIC_TYPE,
};
pub use query::{
    BatchGetRequest, DateRange, DimensionSpec, MetricSpec, ReportQuery, ReportRequest,
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
