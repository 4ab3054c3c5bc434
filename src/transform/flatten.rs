//! Flatten a report into one record per (row, metric set)

use super::metric_types::{MetricTypeMap, DEFAULT_METRIC_TYPE_MAP, DIMENSION_SQL_TYPE};
use super::record::FlatRecord;
use crate::reporting::Report;

/// Record key carrying the view identifier
pub const VIEW_ID_KEY: &str = "viewid";

/// Record key carrying the query start date
pub const TIMESTAMP_KEY: &str = "timestamp";

const API_PREFIX: &str = "ga:";

/// Output column name for an API header: `ga:` prefix removed, lower-cased
pub fn column_name(header: &str) -> String {
    header
        .strip_prefix(API_PREFIX)
        .unwrap_or(header)
        .to_lowercase()
}

/// A column of the flattened output and its SQL type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnType {
    pub name: String,
    pub sql_type: &'static str,
}

/// Turns reports into flat records
#[derive(Debug, Clone, Copy)]
pub struct Flattener {
    type_map: &'static MetricTypeMap,
}

impl Default for Flattener {
    fn default() -> Self {
        Self::new(&DEFAULT_METRIC_TYPE_MAP)
    }
}

impl Flattener {
    pub fn new(type_map: &'static MetricTypeMap) -> Self {
        Self { type_map }
    }

    /// One record per metric set of every row, in row order
    ///
    /// Every record carries all of its row's dimensions, that set's metrics,
    /// `viewid`, and `timestamp`. The timestamp is whatever the caller passes
    /// (the query start date), not the row's own reporting date.
    pub fn flatten(&self, report: &Report, view_id: &str, timestamp: &str) -> Vec<FlatRecord> {
        let mut records = Vec::with_capacity(report.record_count());

        for row in &report.rows {
            let base: FlatRecord = row
                .dimensions
                .iter()
                .map(|d| (column_name(&d.name), d.value.clone()))
                .collect();

            for set in &row.metric_sets {
                let mut record = base.clone();
                for metric in set {
                    record.insert(column_name(&metric.header.name), metric.value.clone());
                }
                record.insert(VIEW_ID_KEY, view_id);
                record.insert(TIMESTAMP_KEY, timestamp);
                records.push(record);
            }
        }

        records
    }

    /// Column types implied by the report header
    ///
    /// Dimensions are always strings; metrics go through the type map.
    pub fn column_types(&self, report: &Report) -> Vec<ColumnType> {
        let Some(header) = &report.column_header else {
            return Vec::new();
        };

        let dimensions = header.dimensions.iter().map(|d| ColumnType {
            name: column_name(d),
            sql_type: DIMENSION_SQL_TYPE,
        });
        let metrics = header.metrics.iter().map(|m| ColumnType {
            name: column_name(&m.name),
            sql_type: self.type_map.sql_type(&m.metric_type),
        });

        dimensions.chain(metrics).collect()
    }
}
