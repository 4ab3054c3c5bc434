//! Transform module
//!
//! Reshapes fetched reports into flat, line-oriented records.
//!
//! # Overview
//!
//! - `Flattener` expands each report row into one record per metric set,
//!   keyed by lower-cased column names with the `ga:` prefix removed
//! - `MetricTypeMap` maps API metric types to SQL column types
//! - `flatten_account_summaries` expands the account hierarchy into one
//!   record per profile

mod accounts;
mod flatten;
mod metric_types;
mod record;

pub use accounts::{flatten_account_summaries, AccountSummaryRecord};
pub use flatten::{column_name, ColumnType, Flattener, TIMESTAMP_KEY, VIEW_ID_KEY};
pub use metric_types::{
    MetricTypeMap, DEFAULT_METRIC_TYPE_MAP, DIMENSION_SQL_TYPE, FALLBACK_SQL_TYPE,
};
pub use record::FlatRecord;

#[cfg(test)]
mod tests;
