//! Multi-select record filtering
//!
//! Each dimension is a set of accepted values. An empty set leaves that
//! dimension unrestricted; a row must satisfy every restricted dimension.

use std::collections::BTreeSet;
use crate::ingest::normalize::fold_upper;
use crate::record::PriceRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub states: BTreeSet<String>,
    pub cities: BTreeSet<String>,
    pub speeds: BTreeSet<i64>,
    pub service_types: BTreeSet<String>,
    pub physical_media: BTreeSet<String>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a state code; normalized like ingested values
    pub fn state(mut self, value: &str) -> Self {
        self.states.insert(fold_upper(value));
        self
    }

    /// Accept a city; normalized like ingested values
    pub fn city(mut self, value: &str) -> Self {
        self.cities.insert(fold_upper(value));
        self
    }

    pub fn speed(mut self, value: i64) -> Self {
        self.speeds.insert(value);
        self
    }

    pub fn service_type(mut self, value: &str) -> Self {
        self.service_types.insert(value.trim().to_string());
        self
    }

    pub fn physical_medium(mut self, value: &str) -> Self {
        self.physical_media.insert(value.trim().to_string());
        self
    }

    /// True when no dimension is restricted
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
            && self.cities.is_empty()
            && self.speeds.is_empty()
            && self.service_types.is_empty()
            && self.physical_media.is_empty()
    }

    pub fn matches(&self, record: &PriceRecord) -> bool {
        (self.states.is_empty() || self.states.contains(&record.state_code))
            && (self.cities.is_empty() || self.cities.contains(&record.city))
            && (self.service_types.is_empty() || self.service_types.contains(&record.service_type))
            && (self.speeds.is_empty() || record.speed.is_some_and(|s| self.speeds.contains(&s)))
            && (self.physical_media.is_empty()
                || record
                    .physical_medium
                    .as_ref()
                    .is_some_and(|m| self.physical_media.contains(m)))
    }

    /// Rows that pass the filter, in their original order
    pub fn apply(&self, records: &[PriceRecord]) -> Vec<PriceRecord> {
        records.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}
