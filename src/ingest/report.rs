//! Ingestion outcome: what was read, kept and dropped

use std::collections::BTreeMap;
use serde::Serialize;

/// Why a CSV row was left out of the batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The identifying link is blank
    MissingKey,
    /// A required non-key field (city, state, service type, composite speed) is blank
    MissingField,
    /// A key column holds a value that does not parse
    UnparseableValue,
    /// The CSV reader could not decode the record
    MalformedRecord,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::MissingKey => "missing_key",
            RejectReason::MissingField => "missing_field",
            RejectReason::UnparseableValue => "unparseable_value",
            RejectReason::MalformedRecord => "malformed_record",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Counts produced by one ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Data rows seen (header excluded)
    pub rows_read: usize,
    /// Rows that made it into the batch
    pub accepted: usize,
    pub rejected: BTreeMap<RejectReason, usize>,
    /// Cells that failed to parse and were stored as NULL
    pub nulled_values: usize,
    /// Rows applied by the store
    pub written: usize,
}

impl IngestReport {
    pub fn reject(&mut self, reason: RejectReason) {
        *self.rejected.entry(reason).or_insert(0) += 1;
    }

    pub fn rejected_for(&self, reason: RejectReason) -> usize {
        self.rejected.get(&reason).copied().unwrap_or(0)
    }

    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }
}

impl std::fmt::Display for IngestReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Ingestion Report:")?;
        writeln!(f, "  Rows read: {}", self.rows_read)?;
        writeln!(f, "  Accepted: {}", self.accepted)?;
        writeln!(f, "  Rejected: {}", self.rejected_total())?;
        for (reason, count) in &self.rejected {
            writeln!(f, "    {}: {}", reason, count)?;
        }
        writeln!(f, "  Nulled values: {}", self.nulled_values)?;
        write!(f, "  Written: {}", self.written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally() {
        let mut report = IngestReport::default();
        report.reject(RejectReason::MissingKey);
        report.reject(RejectReason::MissingKey);
        report.reject(RejectReason::UnparseableValue);

        assert_eq!(report.rejected_for(RejectReason::MissingKey), 2);
        assert_eq!(report.rejected_for(RejectReason::MalformedRecord), 0);
        assert_eq!(report.rejected_total(), 3);
        assert!(report.to_string().contains("missing_key: 2"));
    }
}
