//! Report wire types and the parsed report model
//!
//! The API returns column headers and rows separately and relies on
//! positional alignment between them. Parsing pairs every value with its
//! header once, so nothing downstream indexes into header lists.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::sync::Arc;

// ============================================================================
// Wire types (batchGet response)
// ============================================================================

/// batchGet response body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGetResponse {
    #[serde(default)]
    pub reports: Vec<RawReport>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReport {
    #[serde(default)]
    pub column_header: Option<RawColumnHeader>,
    #[serde(default)]
    pub data: Option<RawReportData>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawColumnHeader {
    #[serde(default)]
    pub dimensions: Vec<String>,
    #[serde(default)]
    pub metric_header: Option<RawMetricHeader>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMetricHeader {
    #[serde(default)]
    pub metric_header_entries: Vec<RawMetricHeaderEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMetricHeaderEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub metric_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReportData {
    #[serde(default)]
    pub rows: Vec<RawRow>,
    #[serde(default)]
    pub totals: Vec<RawDateRangeValues>,
    #[serde(default)]
    pub row_count: Option<u64>,
    #[serde(default)]
    pub samples_read_counts: Vec<String>,
    #[serde(default)]
    pub sampling_space_sizes: Vec<String>,
    #[serde(default)]
    pub is_data_golden: Option<bool>,
    /// Some responses carry the token next to the rows
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRow {
    #[serde(default)]
    pub dimensions: Vec<String>,
    #[serde(default)]
    pub metrics: Vec<RawDateRangeValues>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDateRangeValues {
    #[serde(default)]
    pub values: Vec<String>,
}

// ============================================================================
// Parsed model
// ============================================================================

/// Metric type the API reports when none is declared
pub const UNSPECIFIED_METRIC_TYPE: &str = "METRIC_TYPE_UNSPECIFIED";

/// A metric column: API name and declared type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricHeader {
    pub name: String,
    pub metric_type: String,
}

/// Ordered dimension names and metric descriptors of a report
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnHeader {
    pub dimensions: Vec<Arc<str>>,
    pub metrics: Vec<Arc<MetricHeader>>,
}

impl ColumnHeader {
    fn from_raw(raw: RawColumnHeader) -> Result<Self> {
        let dimensions = raw.dimensions.into_iter().map(Arc::from).collect();

        let metrics = raw
            .metric_header
            .map(|h| h.metric_header_entries)
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, entry)| {
                let name = entry.name.ok_or_else(|| {
                    Error::parse(format!("metricHeaderEntries[{i}] has no name"))
                })?;
                Ok(Arc::new(MetricHeader {
                    name,
                    metric_type: entry
                        .metric_type
                        .unwrap_or_else(|| UNSPECIFIED_METRIC_TYPE.to_string()),
                }))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            dimensions,
            metrics,
        })
    }
}

/// A dimension value paired with its column name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionValue {
    pub name: Arc<str>,
    pub value: String,
}

/// A metric value paired with its column descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricValue {
    pub header: Arc<MetricHeader>,
    pub value: String,
}

/// One report row: its dimensions and one metric set per date range
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    pub dimensions: Vec<DimensionValue>,
    pub metric_sets: Vec<Vec<MetricValue>>,
}

impl Row {
    fn from_raw(raw: RawRow, header: &ColumnHeader, index: usize) -> Result<Self> {
        if raw.dimensions.len() != header.dimensions.len() {
            return Err(Error::parse(format!(
                "row {index} has {} dimension values but the header declares {}",
                raw.dimensions.len(),
                header.dimensions.len()
            )));
        }

        let dimensions = header
            .dimensions
            .iter()
            .zip(raw.dimensions)
            .map(|(name, value)| DimensionValue {
                name: Arc::clone(name),
                value,
            })
            .collect();

        let metric_sets = raw
            .metrics
            .into_iter()
            .enumerate()
            .map(|(set, values)| {
                if values.values.len() != header.metrics.len() {
                    return Err(Error::parse(format!(
                        "row {index} metric set {set} has {} values but the header declares {}",
                        values.values.len(),
                        header.metrics.len()
                    )));
                }
                Ok(header
                    .metrics
                    .iter()
                    .zip(values.values)
                    .map(|(header, value)| MetricValue {
                        header: Arc::clone(header),
                        value,
                    })
                    .collect())
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            dimensions,
            metric_sets,
        })
    }
}

/// A complete report, possibly merged from several pages
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Report {
    /// None for an empty response
    pub column_header: Option<ColumnHeader>,
    pub rows: Vec<Row>,
    /// Cleared once every page has been merged
    pub next_page_token: Option<String>,
    pub totals: Vec<Vec<String>>,
    pub row_count: Option<u64>,
    pub samples_read_counts: Vec<String>,
    pub sampling_space_sizes: Vec<String>,
    pub is_data_golden: Option<bool>,
}

impl Report {
    /// Report with no header and no rows
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse one page from the wire, pairing values with headers
    pub fn from_raw(raw: RawReport) -> Result<Self> {
        let data = raw.data.unwrap_or_default();

        let column_header = raw.column_header.map(ColumnHeader::from_raw).transpose()?;

        let rows = match &column_header {
            Some(header) => data
                .rows
                .into_iter()
                .enumerate()
                .map(|(i, row)| Row::from_raw(row, header, i))
                .collect::<Result<Vec<_>>>()?,
            None if data.rows.is_empty() => Vec::new(),
            None => {
                return Err(Error::parse(
                    "report has rows but no columnHeader to align them with",
                ))
            }
        };

        Ok(Self {
            column_header,
            rows,
            next_page_token: raw
                .next_page_token
                .or(data.next_page_token)
                .filter(|t| !t.is_empty()),
            totals: data.totals.into_iter().map(|t| t.values).collect(),
            row_count: data.row_count,
            samples_read_counts: data.samples_read_counts,
            sampling_space_sizes: data.sampling_space_sizes,
            is_data_golden: data.is_data_golden,
        })
    }

    /// Merge the next page: rows append in server order, page metadata
    /// (token, totals, counts) comes from the latest page
    pub fn append_page(&mut self, page: Report) {
        if self.column_header.is_none() {
            self.column_header = page.column_header;
        }
        self.rows.extend(page.rows);
        self.next_page_token = page.next_page_token;
        self.totals = page.totals;
        self.row_count = page.row_count.or(self.row_count);
        self.samples_read_counts = page.samples_read_counts;
        self.sampling_space_sizes = page.sampling_space_sizes;
        self.is_data_golden = page.is_data_golden.or(self.is_data_golden);
    }

    /// True when the API returned nothing at all
    pub fn is_empty(&self) -> bool {
        self.column_header.is_none() && self.rows.is_empty()
    }

    /// Number of flat records this report expands to
    pub fn record_count(&self) -> usize {
        self.rows.iter().map(|r| r.metric_sets.len()).sum()
    }
}
