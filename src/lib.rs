//! # linkprice - Dedicated-link pricing dashboard
//!
//! Imports pricing records from CSV into a local SQLite table and answers
//! the questions a pricing dashboard asks of them.
//!
//! linkprice provides:
//! - A CSV ingestion pipeline with header aliasing, value normalization and
//!   per-reason rejection tallies
//! - A SQLite-backed record store with upsert-by-key semantics
//! - Multi-select filtering and mean/count/group-by summaries
//! - TOML configuration and a themed terminal front end

pub mod record;
pub mod storage;
pub mod ingest;
pub mod filter;
pub mod stats;
pub mod config;
pub mod ui;

use std::path::PathBuf;

// Re-exports for convenient access
pub use record::{Field, KeyScheme, PriceRecord};
pub use storage::{DeleteFilter, RecordStore};
pub use ingest::{IngestConfig, IngestReport, Ingestor, RejectReason};
pub use filter::RecordFilter;
pub use stats::{GroupKey, GroupSummary, Summary};

/// Result type alias for linkprice operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for linkprice operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Required column missing from header: {0}")]
    MissingColumn(String),

    #[error("Refusing to delete without a filter (pass an explicit confirm to delete everything)")]
    UnscopedDelete,

    #[error("Invalid column: {0}")]
    InvalidColumn(String),

    #[error("Config error: {0}")]
    Config(String),
}
