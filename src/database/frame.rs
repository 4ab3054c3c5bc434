//! Records to Arrow RecordBatch conversion
//!
//! The table writer loads records through a columnar frame. Columns are the
//! union of keys across all records in first-seen order; a record missing a
//! key contributes a null.

use crate::error::{Error, Result};
use crate::transform::FlatRecord;
use crate::types::{JsonObject, JsonValue};
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use std::collections::HashMap;
use std::sync::Arc;

/// A record that can be loaded into a frame
pub trait FrameRow {
    /// Fields in the record's own order
    fn fields(&self) -> Vec<(&str, JsonValue)>;
}

impl FrameRow for FlatRecord {
    fn fields(&self) -> Vec<(&str, JsonValue)> {
        self.iter()
            .map(|(k, v)| (k, JsonValue::String(v.to_string())))
            .collect()
    }
}

impl FrameRow for JsonObject {
    fn fields(&self) -> Vec<(&str, JsonValue)> {
        self.iter().map(|(k, v)| (k.as_str(), v.clone())).collect()
    }
}

impl FrameRow for JsonValue {
    fn fields(&self) -> Vec<(&str, JsonValue)> {
        match self {
            JsonValue::Object(obj) => obj.fields(),
            _ => Vec::new(),
        }
    }
}

/// Build a RecordBatch from records
///
/// Types are inferred per column: Boolean, Int64, Float64 (mixed numbers),
/// otherwise Utf8. Nested values are stored as their JSON text. A column with
/// only nulls is Utf8.
pub fn records_to_batch<R: FrameRow>(records: &[R]) -> Result<RecordBatch> {
    let mut names: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut rows: Vec<Vec<(usize, JsonValue)>> = Vec::with_capacity(records.len());

    for record in records {
        let mut row = Vec::new();
        for (key, value) in record.fields() {
            let col = match index.get(key) {
                Some(&col) => col,
                None => {
                    let col = names.len();
                    names.push(key.to_string());
                    index.insert(key.to_string(), col);
                    col
                }
            };
            row.push((col, value));
        }
        rows.push(row);
    }

    let mut columns: Vec<Vec<Option<JsonValue>>> = vec![vec![None; rows.len()]; names.len()];
    for (r, row) in rows.into_iter().enumerate() {
        for (col, value) in row {
            columns[col][r] = (!value.is_null()).then_some(value);
        }
    }

    let mut fields = Vec::with_capacity(names.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(names.len());
    for (name, values) in names.into_iter().zip(columns) {
        let data_type = values
            .iter()
            .flatten()
            .map(infer_type)
            .reduce(|a, b| merge_types(&a, &b))
            .unwrap_or(DataType::Utf8);
        arrays.push(build_array(&values, &data_type));
        fields.push(Field::new(name, data_type, true));
    }

    let schema = Arc::new(Schema::new(fields));
    if arrays.is_empty() {
        return Ok(RecordBatch::new_empty(schema));
    }

    RecordBatch::try_new(schema, arrays)
        .map_err(|e| Error::sink(format!("Failed to create RecordBatch: {e}")))
}

fn infer_type(value: &JsonValue) -> DataType {
    match value {
        JsonValue::Bool(_) => DataType::Boolean,
        JsonValue::Number(n) if n.is_i64() => DataType::Int64,
        JsonValue::Number(_) => DataType::Float64,
        _ => DataType::Utf8,
    }
}

fn merge_types(a: &DataType, b: &DataType) -> DataType {
    match (a, b) {
        (a, b) if a == b => a.clone(),
        (DataType::Int64, DataType::Float64) | (DataType::Float64, DataType::Int64) => {
            DataType::Float64
        }
        _ => DataType::Utf8,
    }
}

fn build_array(values: &[Option<JsonValue>], data_type: &DataType) -> ArrayRef {
    match data_type {
        DataType::Boolean => {
            let arr: BooleanArray = values
                .iter()
                .map(|v| v.as_ref().and_then(JsonValue::as_bool))
                .collect();
            Arc::new(arr)
        }
        DataType::Int64 => {
            let arr: Int64Array = values
                .iter()
                .map(|v| v.as_ref().and_then(JsonValue::as_i64))
                .collect();
            Arc::new(arr)
        }
        DataType::Float64 => {
            let arr: Float64Array = values
                .iter()
                .map(|v| v.as_ref().and_then(JsonValue::as_f64))
                .collect();
            Arc::new(arr)
        }
        _ => {
            let arr: StringArray = values
                .iter()
                .map(|v| {
                    v.as_ref().map(|v| match v {
                        JsonValue::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                })
                .collect();
            Arc::new(arr)
        }
    }
}
