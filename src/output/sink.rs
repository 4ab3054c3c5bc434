//! Object store sink: records → NDJSON temp file → one upload

use super::cloud::ObjectUploader;
use super::jsonl::write_jsonl;
use crate::error::{Error, Result};
use serde::Serialize;
use std::io::BufWriter;
use tracing::info;

/// Writes record sets as single NDJSON objects
///
/// The full record set is written to a local temporary file first, so the
/// object only appears once the upload of the complete file succeeds. The
/// temporary file is removed on every path.
#[derive(Debug, Clone)]
pub struct ObjectStoreSink<U> {
    uploader: U,
}

impl<U: ObjectUploader> ObjectStoreSink<U> {
    pub fn new(uploader: U) -> Self {
        Self { uploader }
    }

    pub fn uploader(&self) -> &U {
        &self.uploader
    }

    /// Write `records` to `key` in `bucket`, replacing any existing object
    ///
    /// Returns the number of records written. Zero records produce an empty
    /// object.
    pub async fn write<T: Serialize>(&self, records: &[T], bucket: &str, key: &str) -> Result<usize> {
        let temp = tempfile::NamedTempFile::new()
            .map_err(|e| Error::sink(format!("Failed to create temporary file: {e}")))?;

        let count = {
            let mut writer = BufWriter::new(temp.as_file());
            write_jsonl(&mut writer, records)
                .map_err(|e| Error::sink(format!("Failed to write records: {e}")))?
        };

        self.uploader
            .load_file(temp.path(), key, bucket, true)
            .await?;

        info!("Wrote {count} records to {bucket}/{key}");
        Ok(count)
    }
}
