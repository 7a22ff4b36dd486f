//! Record types - one priced offering per row
//!
//! A row is identified either by its dedicated link alone or by the
//! composite tuple `{city, state_code, link, speed, service_type}`,
//! depending on the [`KeyScheme`] the store was created with.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Columns of the `price_records` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Link,
    Speed,
    IpBlock,
    MonthlyValue,
    ActivationValue,
    City,
    StateCode,
    ServiceType,
    PhysicalMedium,
}

impl Field {
    /// Canonical column name
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Link => "link",
            Field::Speed => "speed",
            Field::IpBlock => "ip_block",
            Field::MonthlyValue => "monthly_value",
            Field::ActivationValue => "activation_value",
            Field::City => "city",
            Field::StateCode => "state_code",
            Field::ServiceType => "service_type",
            Field::PhysicalMedium => "physical_medium",
        }
    }

    /// All fields, in table column order
    pub fn all() -> &'static [Field] {
        &[
            Field::Link,
            Field::Speed,
            Field::IpBlock,
            Field::MonthlyValue,
            Field::ActivationValue,
            Field::City,
            Field::StateCode,
            Field::ServiceType,
            Field::PhysicalMedium,
        ]
    }

    /// Whether the column is stored as TEXT
    pub fn is_text(&self) -> bool {
        !matches!(self, Field::Speed | Field::MonthlyValue | Field::ActivationValue)
    }
}

impl FromStr for Field {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        Field::all()
            .iter()
            .copied()
            .find(|f| f.as_str() == wanted)
            .ok_or_else(|| Error::InvalidColumn(s.to_string()))
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which columns form the identifying key of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyScheme {
    /// The dedicated link alone is the primary key
    Link,
    /// `{city, state_code, link, speed, service_type}` is unique
    #[default]
    Composite,
}

impl KeyScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyScheme::Link => "link",
            KeyScheme::Composite => "composite",
        }
    }

    /// Columns whose equality means "the same record"
    pub fn key_fields(&self) -> &'static [Field] {
        match self {
            KeyScheme::Link => &[Field::Link],
            KeyScheme::Composite => &[
                Field::City,
                Field::StateCode,
                Field::Link,
                Field::Speed,
                Field::ServiceType,
            ],
        }
    }

    /// Fields a row cannot be stored without
    pub fn required_fields(&self) -> &'static [Field] {
        match self {
            KeyScheme::Link => &[Field::Link, Field::City, Field::StateCode, Field::ServiceType],
            KeyScheme::Composite => &[
                Field::Link,
                Field::City,
                Field::StateCode,
                Field::ServiceType,
                Field::Speed,
            ],
        }
    }

    pub fn is_key(&self, field: Field) -> bool {
        self.key_fields().contains(&field)
    }
}

impl FromStr for KeyScheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "link" | "simple" => Ok(KeyScheme::Link),
            "composite" | "tuple" => Ok(KeyScheme::Composite),
            _ => Err(Error::Config(format!("Unknown key scheme: {}", s))),
        }
    }
}

impl std::fmt::Display for KeyScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One priced offering for a dedicated circuit.
///
/// `city` and `state_code` are stored uppercase with diacritics removed;
/// the ingestion pipeline guarantees this for every row it writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    /// Dedicated circuit identifier
    pub link: String,
    /// Service tier (Mbps)
    pub speed: Option<i64>,
    pub ip_block: Option<String>,
    /// Recurring monthly price
    pub monthly_value: Option<f64>,
    /// One-off activation price
    pub activation_value: Option<f64>,
    pub city: String,
    pub state_code: String,
    /// Category used for filtering and grouping
    pub service_type: String,
    pub physical_medium: Option<String>,
}

impl PriceRecord {
    /// Create a record with the required fields; everything else is empty
    pub fn new(
        link: impl Into<String>,
        city: impl Into<String>,
        state_code: impl Into<String>,
        service_type: impl Into<String>,
    ) -> Self {
        Self {
            link: link.into(),
            speed: None,
            ip_block: None,
            monthly_value: None,
            activation_value: None,
            city: city.into(),
            state_code: state_code.into(),
            service_type: service_type.into(),
            physical_medium: None,
        }
    }

    pub fn with_speed(mut self, speed: i64) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_monthly_value(mut self, value: f64) -> Self {
        self.monthly_value = Some(value);
        self
    }

    pub fn with_activation_value(mut self, value: f64) -> Self {
        self.activation_value = Some(value);
        self
    }

    pub fn with_ip_block(mut self, ip_block: impl Into<String>) -> Self {
        self.ip_block = Some(ip_block.into());
        self
    }

    pub fn with_physical_medium(mut self, medium: impl Into<String>) -> Self {
        self.physical_medium = Some(medium.into());
        self
    }

    /// Text value of a column, if the column is text and set
    pub fn text(&self, field: Field) -> Option<&str> {
        match field {
            Field::Link => Some(&self.link),
            Field::City => Some(&self.city),
            Field::StateCode => Some(&self.state_code),
            Field::ServiceType => Some(&self.service_type),
            Field::IpBlock => self.ip_block.as_deref(),
            Field::PhysicalMedium => self.physical_medium.as_deref(),
            Field::Speed | Field::MonthlyValue | Field::ActivationValue => None,
        }
    }
}
