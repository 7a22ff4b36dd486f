//! Aggregate statistics over a (filtered) set of records
//!
//! Means skip NULL values. The combined mean is the average of the two
//! component means, never a row-wise average, and is absent whenever
//! either component is.

use std::collections::BTreeMap;
use serde::Serialize;
use crate::record::PriceRecord;

/// Headline metrics for a set of rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean_monthly: Option<f64>,
    pub mean_activation: Option<f64>,
    pub combined_mean: Option<f64>,
}

impl Summary {
    pub fn of(records: &[PriceRecord]) -> Self {
        let mean_monthly = mean(records.iter().filter_map(|r| r.monthly_value));
        let mean_activation = mean(records.iter().filter_map(|r| r.activation_value));
        Self {
            count: records.len(),
            mean_monthly,
            mean_activation,
            combined_mean: combined_mean(mean_monthly, mean_activation),
        }
    }
}

/// Arithmetic mean, `None` for an empty input
pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.into_iter().fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 { None } else { Some(sum / n as f64) }
}

/// `(monthly + activation) / 2`, defined only when both means are
pub fn combined_mean(monthly: Option<f64>, activation: Option<f64>) -> Option<f64> {
    Some((monthly? + activation?) / 2.0)
}

/// Dimension to group rows by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    State,
    City,
    ServiceType,
    PhysicalMedium,
    Speed,
}

impl GroupKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKey::State => "state",
            GroupKey::City => "city",
            GroupKey::ServiceType => "service_type",
            GroupKey::PhysicalMedium => "physical_medium",
            GroupKey::Speed => "speed",
        }
    }

    fn value(&self, record: &PriceRecord) -> Option<GroupValue> {
        match self {
            GroupKey::State => Some(GroupValue::Text(record.state_code.clone())),
            GroupKey::City => Some(GroupValue::Text(record.city.clone())),
            GroupKey::ServiceType => Some(GroupValue::Text(record.service_type.clone())),
            GroupKey::PhysicalMedium => record.physical_medium.clone().map(GroupValue::Text),
            GroupKey::Speed => record.speed.map(GroupValue::Number),
        }
    }
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// Speeds order numerically, text groups lexically
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum GroupValue {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for GroupValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupValue::Number(n) => write!(f, "{}", n),
            GroupValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Metrics for one group value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub key: String,
    /// Rows in the group, including rows with no monetary values
    pub count: usize,
    pub mean_monthly: Option<f64>,
    pub mean_activation: Option<f64>,
}

/// Summaries per group value, largest group first; ties by key ascending.
///
/// Rows with no value for the grouping column are skipped.
pub fn group_by(records: &[PriceRecord], key: GroupKey) -> Vec<GroupSummary> {
    let mut groups: BTreeMap<GroupValue, Vec<&PriceRecord>> = BTreeMap::new();
    for record in records {
        if let Some(value) = key.value(record) {
            groups.entry(value).or_default().push(record);
        }
    }

    // BTreeMap iteration is key-ascending; the stable sort keeps that for ties
    let mut summaries: Vec<GroupSummary> = groups
        .into_iter()
        .map(|(value, rows)| GroupSummary {
            key: value.to_string(),
            count: rows.len(),
            mean_monthly: mean(rows.iter().filter_map(|r| r.monthly_value)),
            mean_activation: mean(rows.iter().filter_map(|r| r.activation_value)),
        })
        .collect();
    summaries.sort_by(|a, b| b.count.cmp(&a.count));
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(actual: Option<f64>, expected: f64) -> bool {
        actual.is_some_and(|v| (v - expected).abs() < 1e-9)
    }

    fn rows() -> Vec<PriceRecord> {
        vec![
            PriceRecord::new("A", "SAO PAULO", "SP", "IP").with_speed(100).with_monthly_value(100.0),
            PriceRecord::new("B", "CAMPINAS", "SP", "IP")
                .with_speed(200)
                .with_monthly_value(200.0)
                .with_activation_value(500.0),
            PriceRecord::new("C", "RECIFE", "PE", "MPLS")
                .with_speed(100)
                .with_activation_value(300.0),
        ]
    }

    #[test]
    fn test_summary_means_skip_nulls() {
        let summary = Summary::of(&rows());
        assert_eq!(summary.count, 3);
        assert!(approx(summary.mean_monthly, 150.0));
        assert!(approx(summary.mean_activation, 400.0));
        assert!(approx(summary.combined_mean, 275.0));
    }

    #[test]
    fn test_combined_mean_is_mean_of_means() {
        // a row-wise average would give (100 + (200+500)/2 + 300) / 3 = 250
        let summary = Summary::of(&rows());
        let expected = (summary.mean_monthly.unwrap() + summary.mean_activation.unwrap()) / 2.0;
        assert!(approx(summary.combined_mean, expected));
    }

    #[test]
    fn test_empty_set_has_no_means() {
        let summary = Summary::of(&[]);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.mean_monthly, None);
        assert_eq!(summary.mean_activation, None);
        assert_eq!(summary.combined_mean, None);
    }

    #[test]
    fn test_combined_mean_absent_when_one_side_missing() {
        let only_monthly = vec![PriceRecord::new("A", "NATAL", "RN", "IP").with_monthly_value(80.0)];
        let summary = Summary::of(&only_monthly);
        assert!(approx(summary.mean_monthly, 80.0));
        assert_eq!(summary.combined_mean, None);
    }

    #[test]
    fn test_group_by_state() {
        let groups = group_by(&rows(), GroupKey::State);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "SP");
        assert_eq!(groups[0].count, 2);
        assert!(approx(groups[0].mean_monthly, 150.0));
        assert_eq!(groups[1].key, "PE");
        // counted even though it has no monthly value
        assert_eq!(groups[1].count, 1);
        assert_eq!(groups[1].mean_monthly, None);
    }

    #[test]
    fn test_group_by_speed_orders_numerically_on_ties() {
        let mut records = rows();
        records.push(PriceRecord::new("D", "NATAL", "RN", "IP").with_speed(30));
        records.push(PriceRecord::new("E", "NATAL", "RN", "IP").with_speed(30));
        records.push(PriceRecord::new("F", "NATAL", "RN", "IP"));

        let groups = group_by(&records, GroupKey::Speed);
        let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["30", "100", "200"]);
        assert_eq!(groups[0].count, 2);
        assert_eq!(groups[2].count, 1);
    }

    #[test]
    fn test_group_by_skips_null_group_values() {
        let groups = group_by(&rows(), GroupKey::PhysicalMedium);
        assert!(groups.is_empty());
    }
}
