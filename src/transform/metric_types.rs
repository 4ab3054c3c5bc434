//! Metric type to SQL column type mapping

/// SQL type used for every dimension column
pub const DIMENSION_SQL_TYPE: &str = "varchar(255)";

/// SQL type used for metric types the map does not know
pub const FALLBACK_SQL_TYPE: &str = "varchar(255)";

const DEFAULT_ENTRIES: &[(&str, &str)] = &[
    ("METRIC_TYPE_UNSPECIFIED", "varchar(255)"),
    ("CURRENCY", "decimal(20,5)"),
    ("INTEGER", "int(11)"),
    ("FLOAT", "decimal(20,5)"),
    ("PERCENT", "decimal(20,5)"),
    ("TIME", "time"),
];

/// The mapping the connector ships with
pub static DEFAULT_METRIC_TYPE_MAP: MetricTypeMap = MetricTypeMap::new(DEFAULT_ENTRIES);

/// Static lookup from API metric type name to SQL column type
#[derive(Debug, Clone, Copy)]
pub struct MetricTypeMap {
    entries: &'static [(&'static str, &'static str)],
}

impl MetricTypeMap {
    pub const fn new(entries: &'static [(&'static str, &'static str)]) -> Self {
        Self { entries }
    }

    /// SQL type for a metric type name, falling back to a generic string type
    pub fn sql_type(&self, metric_type: &str) -> &'static str {
        self.entries
            .iter()
            .find(|(name, _)| *name == metric_type)
            .map_or(FALLBACK_SQL_TYPE, |&(_, sql)| sql)
    }

    pub fn entries(&self) -> &'static [(&'static str, &'static str)] {
        self.entries
    }
}

impl Default for MetricTypeMap {
    fn default() -> Self {
        DEFAULT_METRIC_TYPE_MAP
    }
}
