//! DuckDB-based table writer
//!
//! Writes frames into a local DuckDB database or, through DuckDB's
//! extensions, into an attached PostgreSQL, MySQL or SQLite database.

use crate::config::Connection as ConnectionRecord;
use crate::error::{Error, Result};
use crate::types::IfExists;
use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use arrow::record_batch::RecordBatch;
use duckdb::types::Value;
use duckdb::{params, params_from_iter, Connection};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Catalog name external databases are attached under
const ATTACHED_CATALOG: &str = "target_db";

/// A column type override: a type name with optional numeric modifiers
static DTYPE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_]*( [A-Za-z][A-Za-z0-9_]*)*(\(\s*\d+\s*(,\s*\d+\s*)?\))?$")
        .expect("valid regex")
});

/// Integer display widths (`int(11)`) that DuckDB does not accept
static INT_WIDTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(tinyint|smallint|int|integer|bigint)\s*\(\s*\d+\s*\)$").expect("valid regex")
});

/// Relational database the table writer targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "engine", rename_all = "lowercase")]
pub enum DatabaseTarget {
    /// DuckDB file, or an in-memory database when `path` is unset
    Duckdb {
        #[serde(default)]
        path: Option<PathBuf>,
    },
    /// PostgreSQL reached through a connection record
    Postgres { conn_id: String },
    /// MySQL reached through a connection record
    Mysql { conn_id: String },
    /// SQLite file
    Sqlite { path: PathBuf },
}

impl DatabaseTarget {
    /// Connection id to resolve before opening, if any
    pub fn conn_id(&self) -> Option<&str> {
        match self {
            DatabaseTarget::Postgres { conn_id } | DatabaseTarget::Mysql { conn_id } => {
                Some(conn_id.as_str())
            }
            _ => None,
        }
    }
}

/// The bulk "write frame to table" operation the relational sink consumes
pub trait FrameWriter {
    /// Write `batch` into `table`, applying the existing-table policy
    ///
    /// `dtypes` overrides the column types used when the table is created.
    /// Returns the number of rows inserted.
    fn write_frame(
        &mut self,
        batch: &RecordBatch,
        table: &str,
        schema: Option<&str>,
        dtypes: &HashMap<String, String>,
        if_exists: IfExists,
    ) -> Result<usize>;

    /// Whether `table` already exists in `schema` (or the default schema)
    fn table_exists(&self, table: &str, schema: Option<&str>) -> Result<bool>;
}

/// Table writer over a DuckDB connection
pub struct TableWriter {
    conn: Connection,
    catalog: String,
    default_schema: String,
    /// Connection description (for logging, no secrets)
    description: String,
}

impl std::fmt::Debug for TableWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableWriter")
            .field("catalog", &self.catalog)
            .field("default_schema", &self.default_schema)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl TableWriter {
    /// Open the target database
    ///
    /// PostgreSQL and MySQL need the connection record named by the target.
    pub fn open(target: &DatabaseTarget, record: Option<&ConnectionRecord>) -> Result<Self> {
        match target {
            DatabaseTarget::Duckdb { path } => {
                let conn = match path {
                    Some(path) => Connection::open(path),
                    None => Connection::open_in_memory(),
                }
                .map_err(|e| Error::config(format!("Failed to open DuckDB: {e}")))?;
                let catalog: String = conn
                    .query_row("SELECT current_database()", [], |row| row.get(0))
                    .map_err(|e| Error::config(format!("Failed to read DuckDB catalog: {e}")))?;
                let description = path.as_ref().map_or_else(
                    || "duckdb::memory:".to_string(),
                    |p| format!("duckdb:{}", p.display()),
                );
                Ok(Self {
                    conn,
                    catalog,
                    default_schema: "main".to_string(),
                    description,
                })
            }
            DatabaseTarget::Postgres { conn_id } => {
                let record = require_record(conn_id, record)?;
                let database = record.schema.clone().unwrap_or_else(|| "postgres".to_string());
                let connection_string = format!(
                    "postgresql://{}:{}@{}:{}/{database}",
                    record.login.as_deref().unwrap_or("postgres"),
                    record.password.as_deref().unwrap_or_default(),
                    record.host.as_deref().unwrap_or("localhost"),
                    record.port.unwrap_or(5432),
                );
                let description = format!(
                    "postgres://{}:{}/{database}",
                    record.host.as_deref().unwrap_or("localhost"),
                    record.port.unwrap_or(5432)
                );
                Self::attach("postgres", "POSTGRES", &connection_string, "public", description)
            }
            DatabaseTarget::Mysql { conn_id } => {
                let record = require_record(conn_id, record)?;
                let database = record
                    .schema
                    .clone()
                    .ok_or_else(|| Error::missing_field(format!("{conn_id}.schema")))?;
                let connection_string = format!(
                    "host={} port={} user={} password={} database={database}",
                    record.host.as_deref().unwrap_or("localhost"),
                    record.port.unwrap_or(3306),
                    record.login.as_deref().unwrap_or("root"),
                    record.password.as_deref().unwrap_or_default(),
                );
                let description = format!(
                    "mysql://{}:{}/{database}",
                    record.host.as_deref().unwrap_or("localhost"),
                    record.port.unwrap_or(3306)
                );
                Self::attach("mysql", "MYSQL", &connection_string, &database, description)
            }
            DatabaseTarget::Sqlite { path } => {
                let path_str = path.to_string_lossy();
                Self::attach("sqlite", "SQLITE", &path_str, "main", format!("sqlite:{path_str}"))
            }
        }
    }

    /// In-memory DuckDB database
    pub fn in_memory() -> Result<Self> {
        Self::open(&DatabaseTarget::Duckdb { path: None }, None)
    }

    fn attach(
        extension: &str,
        db_type: &str,
        connection_string: &str,
        default_schema: &str,
        description: String,
    ) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::config(format!("Failed to create DuckDB connection: {e}")))?;

        conn.execute_batch(&format!("INSTALL {extension}; LOAD {extension};"))
            .map_err(|e| Error::config(format!("Failed to load {extension} extension: {e}")))?;

        let attach_sql = format!(
            "ATTACH '{}' AS {ATTACHED_CATALOG} (TYPE {db_type});",
            connection_string.replace('\'', "''")
        );
        conn.execute_batch(&attach_sql)
            .map_err(|e| Error::config(format!("Failed to attach {description}: {e}")))?;

        info!("Attached {description}");
        Ok(Self {
            conn,
            catalog: ATTACHED_CATALOG.to_string(),
            default_schema: default_schema.to_string(),
            description,
        })
    }

    /// Underlying DuckDB connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Fully quoted `catalog.schema.table`
    pub fn qualified_name(&self, table: &str, schema: Option<&str>) -> String {
        format!(
            "{}.{}.{}",
            quote_ident(&self.catalog),
            quote_ident(schema.unwrap_or(self.default_schema.as_str())),
            quote_ident(table)
        )
    }

    /// Whether `schema.table` exists in the target catalog
    pub fn table_exists(&self, table: &str, schema: Option<&str>) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT count(*) FROM information_schema.tables \
                 WHERE table_catalog = ? AND table_schema = ? AND table_name = ?",
                params![
                    self.catalog,
                    schema.unwrap_or(self.default_schema.as_str()),
                    table
                ],
                |row| row.get(0),
            )
            .map_err(|e| Error::sink(format!("Failed to inspect {table}: {e}")))?;
        Ok(count > 0)
    }
}

impl FrameWriter for TableWriter {
    fn write_frame(
        &mut self,
        batch: &RecordBatch,
        table: &str,
        schema: Option<&str>,
        dtypes: &HashMap<String, String>,
        if_exists: IfExists,
    ) -> Result<usize> {
        let target = self.qualified_name(table, schema);
        let exists = TableWriter::table_exists(self, table, schema)?;
        if exists && if_exists == IfExists::Fail {
            return Err(Error::config(format!(
                "Table {target} already exists and if_exists is 'fail'"
            )));
        }

        if batch.num_rows() == 0 {
            info!("No rows to write to {table}");
            return Ok(0);
        }

        let columns: Vec<(String, String)> = batch
            .schema()
            .fields()
            .iter()
            .map(|field| {
                let sql_type = match dtypes.get(field.name()) {
                    Some(dtype) => column_type(field.name(), dtype)?,
                    None => inferred_type(field.data_type()).to_string(),
                };
                Ok((field.name().clone(), sql_type))
            })
            .collect::<Result<_>>()?;

        for name in dtypes.keys() {
            if batch.schema().field_with_name(name).is_err() {
                warn!("dtype override for unknown column {name} ignored");
            }
        }

        let rows = batch_rows(batch)?;
        let row_count = rows.len();

        let tx = self
            .conn
            .transaction()
            .map_err(|e| Error::sink(format!("Failed to begin transaction: {e}")))?;

        match (exists, if_exists) {
            (true, IfExists::Replace) => {
                let drop_sql = format!("DROP TABLE {target}");
                debug!("{drop_sql}");
                tx.execute_batch(&drop_sql)
                    .map_err(|e| Error::sink(format!("Failed to drop {target}: {e}")))?;
                create_table(&tx, &target, &columns)?;
            }
            (true, _) => {}
            (false, _) => create_table(&tx, &target, &columns)?,
        }

        let column_list = columns
            .iter()
            .map(|(name, _)| quote_ident(name))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = columns
            .iter()
            .map(|(_, sql_type)| format!("CAST(? AS {sql_type})"))
            .collect::<Vec<_>>()
            .join(", ");
        let insert_sql = format!("INSERT INTO {target} ({column_list}) VALUES ({placeholders})");
        debug!("{insert_sql}");

        {
            let mut stmt = tx
                .prepare(&insert_sql)
                .map_err(|e| Error::sink(format!("Failed to prepare insert into {target}: {e}")))?;
            for (i, row) in rows.into_iter().enumerate() {
                stmt.execute(params_from_iter(row))
                    .map_err(|e| Error::sink(format!("Failed to insert row {i} into {target}: {e}")))?;
            }
        }

        tx.commit()
            .map_err(|e| Error::sink(format!("Failed to commit {target}: {e}")))?;

        info!("Wrote {row_count} rows to {target} on {}", self.description);
        Ok(row_count)
    }

    fn table_exists(&self, table: &str, schema: Option<&str>) -> Result<bool> {
        TableWriter::table_exists(self, table, schema)
    }
}

fn require_record<'a>(
    conn_id: &str,
    record: Option<&'a ConnectionRecord>,
) -> Result<&'a ConnectionRecord> {
    record.ok_or_else(|| Error::config(format!("Connection '{conn_id}' is required")))
}

fn create_table(tx: &duckdb::Transaction<'_>, target: &str, columns: &[(String, String)]) -> Result<()> {
    let definitions = columns
        .iter()
        .map(|(name, sql_type)| format!("{} {sql_type}", quote_ident(name)))
        .collect::<Vec<_>>()
        .join(", ");
    let create_sql = format!("CREATE TABLE {target} ({definitions})");
    debug!("{create_sql}");
    tx.execute_batch(&create_sql)
        .map_err(|e| Error::sink(format!("Failed to create {target}: {e}")))
}

/// Quote an SQL identifier
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Validate a dtype override and rewrite it for DuckDB
fn column_type(column: &str, dtype: &str) -> Result<String> {
    let dtype = dtype.trim();
    if !DTYPE_PATTERN.is_match(dtype) {
        return Err(Error::invalid_value(
            format!("dtypes.{column}"),
            format!("'{dtype}' is not a column type"),
        ));
    }
    Ok(match INT_WIDTH.captures(dtype) {
        Some(caps) => caps[1].to_uppercase(),
        None => dtype.to_string(),
    })
}

fn inferred_type(data_type: &DataType) -> &'static str {
    match data_type {
        DataType::Boolean => "BOOLEAN",
        DataType::Int64 => "BIGINT",
        DataType::Float64 => "DOUBLE",
        _ => "VARCHAR",
    }
}

/// Row-major DuckDB values from a frame
fn batch_rows(batch: &RecordBatch) -> Result<Vec<Vec<Value>>> {
    let schema = batch.schema();
    let mut rows = vec![Vec::with_capacity(batch.num_columns()); batch.num_rows()];

    for (col, field) in batch.columns().iter().zip(schema.fields()) {
        for (r, row) in rows.iter_mut().enumerate() {
            let value = if col.is_null(r) {
                Value::Null
            } else {
                match field.data_type() {
                    DataType::Boolean => Value::Boolean(col.as_boolean().value(r)),
                    DataType::Int64 => Value::BigInt(col.as_primitive::<Int64Type>().value(r)),
                    DataType::Float64 => Value::Double(col.as_primitive::<Float64Type>().value(r)),
                    DataType::Utf8 => Value::Text(col.as_string::<i32>().value(r).to_string()),
                    other => {
                        return Err(Error::sink(format!(
                            "Unsupported column type {other} for {}",
                            field.name()
                        )))
                    }
                }
            };
            row.push(value);
        }
    }

    Ok(rows)
}
