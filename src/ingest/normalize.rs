//! Value normalization for ingested cells

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Which character separates the integer and fractional parts of money.
///
/// The other character of the pair is accepted only as a thousands
/// separator between groups of exactly three digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecimalSeparator {
    /// `1,234.56`
    #[default]
    Dot,
    /// `1.234,56`
    Comma,
}

impl DecimalSeparator {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecimalSeparator::Dot => "dot",
            DecimalSeparator::Comma => "comma",
        }
    }

    fn chars(&self) -> (char, char) {
        match self {
            DecimalSeparator::Dot => ('.', ','),
            DecimalSeparator::Comma => (',', '.'),
        }
    }
}

impl FromStr for DecimalSeparator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "dot" | "." => Ok(DecimalSeparator::Dot),
            "comma" | "," => Ok(DecimalSeparator::Comma),
            _ => Err(Error::Config(format!("Unknown decimal separator: {}", s))),
        }
    }
}

impl std::fmt::Display for DecimalSeparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Remove diacritics: NFD decomposition with combining marks dropped
pub fn strip_accents(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Trimmed, accent-free, uppercase form used for city and state codes
pub fn fold_upper(s: &str) -> String {
    strip_accents(s.trim()).to_uppercase()
}

/// Trimmed text, or `None` when blank
pub fn clean_text(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a monetary amount under one decimal policy.
///
/// Accepts an optional `R$` prefix and a leading minus sign. Amounts
/// too large for an `f64` do not parse.
pub fn parse_money(raw: &str, separator: DecimalSeparator) -> Option<f64> {
    let s = raw.trim();
    let s = s.strip_prefix("R$").unwrap_or(s).trim();
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, s),
    };
    if body.is_empty() {
        return None;
    }

    let (decimal, thousands) = separator.chars();
    let (int_part, frac_part) = match body.split_once(decimal) {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (body, None),
    };

    if let Some(frac) = frac_part {
        if !all_digits(frac) {
            return None;
        }
    }

    let digits = if int_part.contains(thousands) {
        let mut groups = int_part.split(thousands);
        let first = groups.next().unwrap_or_default();
        if first.len() > 3 || !all_digits(first) {
            return None;
        }
        let mut digits = first.to_string();
        for group in groups {
            if group.len() != 3 || !all_digits(group) {
                return None;
            }
            digits.push_str(group);
        }
        digits
    } else if int_part.is_empty() {
        // ".50" style: only valid with a fractional part
        frac_part?;
        "0".to_string()
    } else if all_digits(int_part) {
        int_part.to_string()
    } else {
        return None;
    };

    let normalized = format!(
        "{}{}.{}",
        if negative { "-" } else { "" },
        digits,
        frac_part.unwrap_or("0")
    );
    normalized.parse().ok().filter(|v: &f64| v.is_finite())
}

const SPEED_SUFFIXES: &[&str] = &["mbps", "mb/s", "mb", "m"];

/// Parse a speed tier in Mbps: `100`, `100 Mbps`, `100.0`
pub fn parse_speed(raw: &str) -> Option<i64> {
    let lower = raw.trim().to_ascii_lowercase();
    let s = SPEED_SUFFIXES
        .iter()
        .find_map(|suffix| lower.strip_suffix(suffix))
        .unwrap_or(lower.as_str())
        .trim();

    let int_part = match s.split_once('.') {
        Some((int_part, frac)) if !frac.is_empty() && frac.bytes().all(|b| b == b'0') => int_part,
        Some(_) => return None,
        None => s,
    };
    if !all_digits(int_part) {
        return None;
    }
    int_part.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_upper() {
        assert_eq!(fold_upper("são paulo"), "SAO PAULO");
        assert_eq!(fold_upper("  Florianópolis "), "FLORIANOPOLIS");
        assert_eq!(fold_upper("Açailândia"), "ACAILANDIA");
        assert_eq!(fold_upper("sp"), "SP");
    }

    #[test]
    fn test_money_dot_policy() {
        let dot = DecimalSeparator::Dot;
        assert_eq!(parse_money("10.50", dot), Some(10.5));
        assert_eq!(parse_money("1,234.56", dot), Some(1234.56));
        assert_eq!(parse_money("R$ 99", dot), Some(99.0));
        assert_eq!(parse_money("-5.25", dot), Some(-5.25));
        assert_eq!(parse_money(".75", dot), Some(0.75));
        assert_eq!(parse_money("10,50", dot), None);
        assert_eq!(parse_money("1.2.3", dot), None);
        assert_eq!(parse_money("abc", dot), None);
        assert_eq!(parse_money("", dot), None);
        assert_eq!(parse_money("NaN", dot), None);
        assert_eq!(parse_money(&format!("1{}", "0".repeat(400)), dot), None);
    }

    #[test]
    fn test_money_comma_policy() {
        let comma = DecimalSeparator::Comma;
        assert_eq!(parse_money("10,50", comma), Some(10.5));
        assert_eq!(parse_money("1.234,56", comma), Some(1234.56));
        assert_eq!(parse_money("R$1.500", comma), Some(1500.0));
        assert_eq!(parse_money("10.50", comma), None);
        assert_eq!(parse_money("1,2,3", comma), None);
    }

    #[test]
    fn test_parse_speed() {
        assert_eq!(parse_speed("100"), Some(100));
        assert_eq!(parse_speed(" 300 Mbps"), Some(300));
        assert_eq!(parse_speed("50MB"), Some(50));
        assert_eq!(parse_speed("100.0"), Some(100));
        assert_eq!(parse_speed("100.5"), None);
        assert_eq!(parse_speed("1 Gbps"), None);
        assert_eq!(parse_speed("-10"), None);
        assert_eq!(parse_speed(""), None);
    }

    #[test]
    fn test_decimal_separator_from_str() {
        assert_eq!("Comma".parse::<DecimalSeparator>().unwrap(), DecimalSeparator::Comma);
        assert_eq!(".".parse::<DecimalSeparator>().unwrap(), DecimalSeparator::Dot);
        assert!(matches!("semicolon".parse::<DecimalSeparator>(), Err(Error::Config(_))));
    }
}
