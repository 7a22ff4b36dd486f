//! Ingestion Pipeline - CSV files into the record store
//!
//! Steps, in order:
//! 1. Header normalization (trim, lowercase, alias lookup)
//! 2. Row filtering (blank key or required field drops the row)
//! 3. Value coercion (money under one decimal policy, speed as integer,
//!    city/state uppercased without accents)
//! 4. One `upsert_many` call with every accepted row
//!
//! Row-level problems never fail an import; they are tallied in the
//! [`IngestReport`].

pub mod header;
pub mod normalize;
pub mod pipeline;
pub mod report;

pub use header::{ColumnAliases, HeaderMap};
pub use normalize::DecimalSeparator;
pub use pipeline::{IngestConfig, Ingestor};
pub use report::{IngestReport, RejectReason};
