//! Report query and the batchGet request body built from it

use crate::error::{Error, Result};
use crate::types::{JsonValue, SamplingLevel};
use serde::{Deserialize, Serialize};

/// Largest page the reporting API accepts
pub const MAX_PAGE_SIZE: u32 = 10_000;

/// Page size used when the query does not set one
pub const DEFAULT_PAGE_SIZE: u32 = 1_000;

/// A dimension requested in a report, e.g. `ga:country`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DimensionInput")]
#[serde(rename_all = "camelCase")]
pub struct DimensionSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub histogram_buckets: Option<Vec<String>>,
}

impl DimensionSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            histogram_buckets: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DimensionInput {
    Name(String),
    #[serde(rename_all = "camelCase")]
    Full {
        name: String,
        #[serde(default, alias = "histogram_buckets")]
        histogram_buckets: Option<Vec<String>>,
    },
}

impl From<DimensionInput> for DimensionSpec {
    fn from(input: DimensionInput) -> Self {
        match input {
            DimensionInput::Name(name) => Self::new(name),
            DimensionInput::Full {
                name,
                histogram_buckets,
            } => Self {
                name,
                histogram_buckets,
            },
        }
    }
}

/// A metric requested in a report, e.g. `ga:sessions`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "MetricInput")]
#[serde(rename_all = "camelCase")]
pub struct MetricSpec {
    pub expression: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatting_type: Option<String>,
}

impl MetricSpec {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            alias: None,
            formatting_type: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MetricInput {
    Expression(String),
    #[serde(rename_all = "camelCase")]
    Full {
        expression: String,
        #[serde(default)]
        alias: Option<String>,
        #[serde(default, alias = "formatting_type")]
        formatting_type: Option<String>,
    },
}

impl From<MetricInput> for MetricSpec {
    fn from(input: MetricInput) -> Self {
        match input {
            MetricInput::Expression(expression) => Self::new(expression),
            MetricInput::Full {
                expression,
                alias,
                formatting_type,
            } => Self {
                expression,
                alias,
                formatting_type,
            },
        }
    }
}

/// Everything needed to request one report; immutable for an execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportQuery {
    pub view_id: String,
    /// Start date, `YYYY-MM-DD`
    pub since: String,
    /// End date, `YYYY-MM-DD`
    pub until: String,
    #[serde(default)]
    pub sampling_level: Option<SamplingLevel>,
    pub dimensions: Vec<DimensionSpec>,
    pub metrics: Vec<MetricSpec>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub include_empty_rows: Option<bool>,
    #[serde(default)]
    pub dimension_filter_clauses: Option<JsonValue>,
}

impl ReportQuery {
    /// Create a query with API defaults for everything optional
    pub fn new(
        view_id: impl Into<String>,
        since: impl Into<String>,
        until: impl Into<String>,
    ) -> Self {
        Self {
            view_id: view_id.into(),
            since: since.into(),
            until: until.into(),
            sampling_level: None,
            dimensions: Vec::new(),
            metrics: Vec::new(),
            page_size: None,
            include_empty_rows: None,
            dimension_filter_clauses: None,
        }
    }

    #[must_use]
    pub fn dimension(mut self, name: impl Into<String>) -> Self {
        self.dimensions.push(DimensionSpec::new(name));
        self
    }

    #[must_use]
    pub fn metric(mut self, expression: impl Into<String>) -> Self {
        self.metrics.push(MetricSpec::new(expression));
        self
    }

    #[must_use]
    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    #[must_use]
    pub fn include_empty_rows(mut self, include: bool) -> Self {
        self.include_empty_rows = Some(include);
        self
    }

    #[must_use]
    pub fn sampling_level(mut self, level: SamplingLevel) -> Self {
        self.sampling_level = Some(level);
        self
    }

    #[must_use]
    pub fn dimension_filter_clauses(mut self, clauses: JsonValue) -> Self {
        self.dimension_filter_clauses = Some(clauses);
        self
    }

    /// Reject queries the API would refuse
    pub fn validate(&self) -> Result<()> {
        if self.view_id.is_empty() {
            return Err(Error::missing_field("view_id"));
        }
        if let Some(size) = self.page_size {
            if size > MAX_PAGE_SIZE {
                return Err(Error::config(format!(
                    "Please specify a page size equal to or lower than {MAX_PAGE_SIZE} (got {size})"
                )));
            }
        }
        if self.metrics.is_empty() {
            return Err(Error::missing_field("metrics"));
        }
        Ok(())
    }

    /// Effective page size, defaulted and capped
    pub fn effective_page_size(&self) -> u32 {
        match self.page_size {
            Some(0) | None => DEFAULT_PAGE_SIZE,
            Some(size) => size.min(MAX_PAGE_SIZE),
        }
    }

    /// Build the first-page request body
    pub fn to_request(&self) -> ReportRequest {
        ReportRequest {
            view_id: self.view_id.clone(),
            date_ranges: vec![DateRange {
                start_date: self.since.clone(),
                end_date: self.until.clone(),
            }],
            sampling_level: self.sampling_level.unwrap_or_default(),
            dimensions: self.dimensions.clone(),
            metrics: self.metrics.clone(),
            page_size: self.effective_page_size(),
            include_empty_rows: self.include_empty_rows.unwrap_or(false),
            dimension_filter_clauses: self.dimension_filter_clauses.clone(),
            page_token: None,
        }
    }
}

/// Date range of a report request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: String,
    pub end_date: String,
}

/// One entry of `reportRequests` in a batchGet body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub view_id: String,
    pub date_ranges: Vec<DateRange>,
    pub sampling_level: SamplingLevel,
    pub dimensions: Vec<DimensionSpec>,
    pub metrics: Vec<MetricSpec>,
    pub page_size: u32,
    pub include_empty_rows: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension_filter_clauses: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
}

/// batchGet request body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGetRequest<'a> {
    pub report_requests: [&'a ReportRequest; 1],
}

impl<'a> BatchGetRequest<'a> {
    pub fn new(request: &'a ReportRequest) -> Self {
        Self {
            report_requests: [request],
        }
    }
}
