//! Output module
//!
//! Handles newline-delimited JSON serialization and object storage upload.
//!
//! # Overview
//!
//! This module provides utilities for:
//! - Serializing records as NDJSON (`write_jsonl`)
//! - Uploading files to object storage (S3, GCS, Azure, local, in-memory)
//! - The object store sink that ties the two together

mod cloud;
mod jsonl;
mod sink;

pub use cloud::{ObjectStoreUploader, ObjectUploader, StorageTarget};
pub use jsonl::{to_jsonl_bytes, write_jsonl};
pub use sink::ObjectStoreSink;
