//! Storage Layer - SQLite-backed persistence
//!
//! System of record is a single SQLite table:
//! - price_records(link, speed, ip_block, monthly_value, activation_value,
//!   city, state_code, service_type, physical_medium)
//!
//! keyed either by `link` or by the composite tuple
//! `(city, state_code, link, speed, service_type)`.

pub mod schema;
pub mod sqlite;

pub use sqlite::{RecordStore, DeleteFilter, StoreStats};
