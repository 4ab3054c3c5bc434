//! Newline-delimited JSON serialization

use crate::error::Result;
use serde::Serialize;
use std::io::Write;

/// Write one JSON document per record, separated by `\n`
///
/// No newline follows the last record. Returns the number of records written.
pub fn write_jsonl<W, T>(writer: &mut W, records: &[T]) -> Result<usize>
where
    W: Write,
    T: Serialize,
{
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            writer.write_all(b"\n")?;
        }
        serde_json::to_writer(&mut *writer, record)?;
    }
    writer.flush()?;
    Ok(records.len())
}

/// Serialize records to an in-memory NDJSON buffer
pub fn to_jsonl_bytes<T: Serialize>(records: &[T]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_jsonl(&mut buf, records)?;
    Ok(buf)
}
