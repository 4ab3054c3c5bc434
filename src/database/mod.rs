//! Relational table output via DuckDB
//!
//! Records are loaded into an Arrow frame and written with DuckDB, either
//! into a DuckDB database or into PostgreSQL, MySQL or SQLite attached
//! through DuckDB's extensions.

mod engine;
mod frame;
mod sink;

pub use engine::{quote_ident, DatabaseTarget, FrameWriter, TableWriter};
pub use frame::{records_to_batch, FrameRow};
pub use sink::{write_records, TableOptions};
