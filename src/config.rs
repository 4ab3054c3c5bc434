//! Configuration types for connections and task definitions
//!
//! Connections are looked up by id in a `ConnectionStore` (a YAML/JSON file,
//! falling back to `GA_CONN_<ID>` environment variables). Tasks are YAML/JSON
//! documents tagged with the pipeline they run.

use crate::database::{DatabaseTarget, TableOptions};
use crate::error::{Error, Result};
use crate::output::StorageTarget;
use crate::reporting::{ApiEndpoints, DimensionSpec, MetricSpec, ReportQuery, DEFAULT_PAGE_SIZE};
use crate::types::{JsonValue, SamplingLevel};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix of environment variables that define connections
pub const CONNECTION_ENV_PREFIX: &str = "GA_CONN_";

/// Environment variable naming the connector home directory
pub const HOME_ENV: &str = "GA_CONNECTOR_HOME";

// ============================================================================
// Connections
// ============================================================================

/// A connection record from the credential store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    #[serde(default)]
    pub login: Option<String>,
    /// Bearer token for analytics connections, password otherwise
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    /// Database name for relational connections
    #[serde(default)]
    pub schema: Option<String>,
    /// Free-form extras, as an object or a JSON-encoded string
    #[serde(default)]
    pub extra: Option<JsonValue>,
}

impl Connection {
    /// Parse a JSON connection record
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| Error::config(format!("Malformed connection: {e}")))
    }

    /// Non-empty password, used as a pre-obtained access token
    pub fn bearer_token(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }

    pub fn login_and_password(&self) -> Option<(&str, &str)> {
        Some((self.login.as_deref()?, self.password.as_deref()?))
    }

    /// A field of `extra`; string values holding JSON objects are decoded
    pub fn extra_field(&self, name: &str) -> Option<JsonValue> {
        let extra = match self.extra.as_ref()? {
            JsonValue::String(s) => serde_json::from_str(s).ok()?,
            other => other.clone(),
        };
        match extra.get(name)? {
            JsonValue::Null => None,
            JsonValue::String(s) => match serde_json::from_str::<JsonValue>(s) {
                Ok(parsed @ JsonValue::Object(_)) => Some(parsed),
                _ => Some(JsonValue::String(s.clone())),
            },
            other => Some(other.clone()),
        }
    }
}

/// Connections by id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionStore {
    connections: HashMap<String, Connection>,
}

impl ConnectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a YAML or JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read connections {}: {e}", path.display()))
        })?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn insert(&mut self, conn_id: impl Into<String>, connection: Connection) {
        self.connections.insert(conn_id.into(), connection);
    }

    /// Look a connection up, falling back to `GA_CONN_<ID>`
    pub fn get(&self, conn_id: &str) -> Result<Connection> {
        if let Some(connection) = self.connections.get(conn_id) {
            return Ok(connection.clone());
        }
        let var = connection_env_var(conn_id);
        match std::env::var(&var) {
            Ok(json) => Connection::from_json(&json),
            Err(_) => Err(Error::config(format!(
                "Connection '{conn_id}' is not defined (checked the connection store and ${var})"
            ))),
        }
    }
}

/// Environment variable consulted for a connection id
pub fn connection_env_var(conn_id: &str) -> String {
    let id: String = conn_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("{CONNECTION_ENV_PREFIX}{id}")
}

/// Directory key files are resolved against
pub fn keys_dir() -> PathBuf {
    std::env::var_os(HOME_ENV)
        .map_or_else(|| PathBuf::from("."), PathBuf::from)
        .join("keys")
}

/// Full path of a named key file; absolute paths are kept
pub fn resolve_key_file(name: &str) -> PathBuf {
    keys_dir().join(name)
}

/// Reduce `YYYY-MM-DD HH:MM:SS` to `YYYY-MM-DD`; anything else is kept
pub fn normalize_date(value: &str) -> String {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .map_or_else(|_| value.to_string(), |dt| dt.format("%Y-%m-%d").to_string())
}

// ============================================================================
// Report Task Config
// ============================================================================

/// Report settings shared by the report tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportTaskConfig {
    pub google_analytics_conn_id: String,
    pub view_id: String,
    pub since: String,
    pub until: String,
    #[serde(default)]
    pub sampling_level: Option<SamplingLevel>,
    #[serde(default)]
    pub dimensions: Vec<DimensionSpec>,
    pub metrics: Vec<MetricSpec>,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_true")]
    pub include_empty_rows: bool,
    #[serde(default)]
    pub dimension_filter_clauses: Option<JsonValue>,
    /// Service-account key file name under the keys directory
    #[serde(default)]
    pub key_file: Option<String>,
    /// Pause between page requests
    #[serde(default = "default_page_pause_ms")]
    pub page_pause_ms: u64,
    #[serde(default)]
    pub endpoints: ApiEndpoints,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_true() -> bool {
    true
}

fn default_page_pause_ms() -> u64 {
    1000
}

impl ReportTaskConfig {
    /// The query to fetch, with dates reduced to `YYYY-MM-DD`
    pub fn query(&self) -> ReportQuery {
        ReportQuery {
            view_id: self.view_id.clone(),
            since: normalize_date(&self.since),
            until: normalize_date(&self.until),
            sampling_level: self.sampling_level,
            dimensions: self.dimensions.clone(),
            metrics: self.metrics.clone(),
            page_size: Some(self.page_size),
            include_empty_rows: Some(self.include_empty_rows),
            dimension_filter_clauses: self.dimension_filter_clauses.clone(),
        }
    }

    /// Value written to every record's `timestamp`: `since` as configured
    pub fn timestamp(&self) -> &str {
        &self.since
    }

    pub fn page_pause(&self) -> Duration {
        Duration::from_millis(self.page_pause_ms)
    }

    pub fn key_path(&self) -> Option<PathBuf> {
        self.key_file.as_deref().map(resolve_key_file)
    }

    pub fn validate(&self) -> Result<()> {
        if self.google_analytics_conn_id.is_empty() {
            return Err(Error::missing_field("google_analytics_conn_id"));
        }
        self.query().validate()
    }
}

// ============================================================================
// Task Definitions
// ============================================================================

/// Report → NDJSON object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportToObjectStoreConfig {
    #[serde(flatten)]
    pub report: ReportTaskConfig,
    pub storage: StorageTarget,
    pub bucket: String,
    pub key: String,
}

/// Report → relational table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportToTableConfig {
    #[serde(flatten)]
    pub report: ReportTaskConfig,
    pub database: DatabaseTarget,
    pub destination: TableOptions,
    /// Derive column types from the report's metric types; `dtypes` still win
    #[serde(default)]
    pub typed_columns: bool,
}

/// Account summaries → NDJSON object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSummariesConfig {
    pub google_analytics_conn_id: String,
    #[serde(default)]
    pub key_file: Option<String>,
    pub brand: String,
    pub space: String,
    pub storage: StorageTarget,
    pub bucket: String,
    pub key: String,
    #[serde(default)]
    pub endpoints: ApiEndpoints,
}

impl AccountSummariesConfig {
    pub fn key_path(&self) -> Option<PathBuf> {
        self.key_file.as_deref().map(resolve_key_file)
    }
}

/// A task document, tagged by `task`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum TaskDefinition {
    ReportToObjectStore(ReportToObjectStoreConfig),
    ReportToTable(ReportToTableConfig),
    AccountSummariesToObjectStore(AccountSummariesConfig),
}

impl TaskDefinition {
    /// Load and validate a YAML or JSON task file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read task {}: {e}", path.display())))?;
        Self::from_str(&content)
    }

    /// Parse and validate a task document
    ///
    /// Flag types are checked on the raw document so a quoted `"true"` is
    /// rejected rather than coerced.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let raw: JsonValue = serde_yaml::from_str(content)?;
        check_boolean(&raw, "include_empty_rows")?;
        check_boolean(&raw, "typed_columns")?;

        let task: Self = serde_json::from_value(raw)
            .map_err(|e| Error::config(format!("Invalid task definition: {e}")))?;
        task.validate()?;
        Ok(task)
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            TaskDefinition::ReportToObjectStore(config) => {
                config.report.validate()?;
                require("bucket", &config.bucket)?;
                require("key", &config.key)
            }
            TaskDefinition::ReportToTable(config) => {
                config.report.validate()?;
                require("destination.table", &config.destination.table)
            }
            TaskDefinition::AccountSummariesToObjectStore(config) => {
                require("google_analytics_conn_id", &config.google_analytics_conn_id)?;
                require("bucket", &config.bucket)?;
                require("key", &config.key)
            }
        }
    }

    /// Task kind as written in the document
    pub fn kind(&self) -> &'static str {
        match self {
            TaskDefinition::ReportToObjectStore(_) => "report_to_object_store",
            TaskDefinition::ReportToTable(_) => "report_to_table",
            TaskDefinition::AccountSummariesToObjectStore(_) => "account_summaries_to_object_store",
        }
    }
}

fn check_boolean(raw: &JsonValue, field: &str) -> Result<()> {
    match raw.get(field) {
        None | Some(JsonValue::Bool(_)) => Ok(()),
        Some(other) => Err(Error::invalid_value(
            field,
            format!("Please specify \"{field}\" as a boolean (got {other})"),
        )),
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::missing_field(field));
    }
    Ok(())
}
