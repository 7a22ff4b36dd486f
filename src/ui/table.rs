use tabled::{builder::Builder, settings::Style, Table, Tabled};
use crate::record::PriceRecord;
use crate::stats::{GroupKey, GroupSummary};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }
        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn metrics_table(stats: &[(&str, String)]) -> String {
    let mut builder = TableBuilder::new();
    for (label, value) in stats {
        builder.add_row(label, value);
    }
    builder.build()
}

/// `R$ 1,234.56`, or `-` when absent
pub fn format_money(value: Option<f64>) -> String {
    let Some(value) = value else {
        return "-".to_string();
    };
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::new();
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}R$ {}.{}", sign, grouped, frac_part)
}

fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "Link")]
    link: String,
    #[tabled(rename = "UF")]
    state_code: String,
    #[tabled(rename = "City")]
    city: String,
    #[tabled(rename = "Service")]
    service_type: String,
    #[tabled(rename = "Speed")]
    speed: String,
    #[tabled(rename = "Medium")]
    physical_medium: String,
    #[tabled(rename = "IP block")]
    ip_block: String,
    #[tabled(rename = "Monthly")]
    monthly_value: String,
    #[tabled(rename = "Activation")]
    activation_value: String,
}

impl From<&PriceRecord> for RecordRow {
    fn from(r: &PriceRecord) -> Self {
        Self {
            link: r.link.clone(),
            state_code: r.state_code.clone(),
            city: r.city.clone(),
            service_type: r.service_type.clone(),
            speed: r.speed.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
            physical_medium: or_dash(r.physical_medium.as_deref()),
            ip_block: or_dash(r.ip_block.as_deref()),
            monthly_value: format_money(r.monthly_value),
            activation_value: format_money(r.activation_value),
        }
    }
}

/// Detailed table of records
pub fn records_table(records: &[PriceRecord]) -> String {
    let rows: Vec<RecordRow> = records.iter().map(RecordRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Group-by table; the first column is titled after the grouping key
pub fn groups_table(groups: &[GroupSummary], key: GroupKey) -> String {
    let mut builder = Builder::default();
    builder.push_record([key.as_str(), "Count", "Mean monthly", "Mean activation"].map(String::from));
    for g in groups {
        builder.push_record([
            g.key.clone(),
            g.count.to_string(),
            format_money(g.mean_monthly),
            format_money(g.mean_activation),
        ]);
    }
    builder.build().with(Style::rounded()).to_string()
}
