//! I/O module
//!
//! Handles the subscription tables on disk and the inbound request body.
//!
//! # Components
//!
//! - `csv_format` - Table row formats and their conversion to domain types
//! - `table_store` - CSV-backed implementation of the subscription store
//! - `payload_reader` - Reads the form-encoded webhook body

pub mod csv_format;
pub mod payload_reader;
pub mod table_store;

pub use payload_reader::read_payload;
pub use table_store::CsvTableStore;
