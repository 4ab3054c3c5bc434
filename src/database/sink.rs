//! Relational table sink

use super::engine::FrameWriter;
use super::frame::{records_to_batch, FrameRow};
use crate::error::{Error, Result};
use crate::types::IfExists;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// Destination table and how to treat it
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableOptions {
    pub table: String,
    #[serde(default)]
    pub schema: Option<String>,
    /// Column name → SQL type, applied when the table is created
    #[serde(default)]
    pub dtypes: HashMap<String, String>,
    #[serde(default)]
    pub if_exists: IfExists,
}

impl TableOptions {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn dtype(mut self, column: impl Into<String>, sql_type: impl Into<String>) -> Self {
        self.dtypes.insert(column.into(), sql_type.into());
        self
    }

    pub fn if_exists(mut self, policy: IfExists) -> Self {
        self.if_exists = policy;
        self
    }
}

/// Load records into a frame and bulk-write it
///
/// Zero records write nothing and leave the table untouched, though the
/// `fail` policy still rejects an existing table.
pub fn write_records<W, R>(writer: &mut W, records: &[R], options: &TableOptions) -> Result<usize>
where
    W: FrameWriter,
    R: FrameRow,
{
    if records.is_empty() {
        if options.if_exists == IfExists::Fail
            && writer.table_exists(&options.table, options.schema.as_deref())?
        {
            return Err(Error::config(format!(
                "Table {} already exists and if_exists is 'fail'",
                display_name(options)
            )));
        }
        info!("No records for {}, skipping insert", options.table);
        return Ok(0);
    }

    let batch = records_to_batch(records)?;
    writer.write_frame(
        &batch,
        &options.table,
        options.schema.as_deref(),
        &options.dtypes,
        options.if_exists,
    )
}

fn display_name(options: &TableOptions) -> String {
    match &options.schema {
        Some(schema) => format!("{schema}.{}", options.table),
        None => options.table.clone(),
    }
}
