//! Header normalization and column aliasing
//!
//! Source files from different tools disagree on column naming
//! (`link` vs `link_dedicado`, `state_code` vs `uf`). Every header is
//! trimmed and lowercased, then looked up in a [`ColumnAliases`] table.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use crate::record::Field;

/// Trim whitespace (and a UTF-8 BOM) and lowercase a header cell
pub fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// Canonical field → accepted source header names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnAliases {
    names: BTreeMap<Field, BTreeSet<String>>,
}

impl ColumnAliases {
    /// Only the canonical names, no aliases
    pub fn canonical() -> Self {
        let names = Field::all()
            .iter()
            .map(|f| (*f, BTreeSet::from([f.as_str().to_string()])))
            .collect();
        Self { names }
    }

    /// Accept `name` as a source header for `field`.
    ///
    /// A name belongs to one field only: inserting it moves it away from
    /// any field that claimed it before.
    pub fn insert(&mut self, field: Field, name: &str) {
        let name = normalize_header(name);
        if name.is_empty() {
            return;
        }
        for (other, names) in self.names.iter_mut() {
            if *other != field && names.remove(&name) {
                tracing::debug!("Header alias '{}' moved from {} to {}", name, other, field);
            }
        }
        self.names.entry(field).or_default().insert(name);
    }

    /// Builder form of [`ColumnAliases::insert`]
    pub fn with(mut self, field: Field, names: &[&str]) -> Self {
        for name in names {
            self.insert(field, name);
        }
        self
    }

    /// Field a normalized header refers to
    pub fn resolve(&self, header: &str) -> Option<Field> {
        let header = normalize_header(header);
        self.names
            .iter()
            .find(|(_, names)| names.contains(&header))
            .map(|(field, _)| *field)
    }
}

impl Default for ColumnAliases {
    /// Canonical names plus the Portuguese headers of the source spreadsheets
    fn default() -> Self {
        Self::canonical()
            .with(Field::Link, &["link_dedicado", "circuito"])
            .with(Field::Speed, &["velocidade", "velocidade_mbps"])
            .with(Field::IpBlock, &["bloco_ip"])
            .with(Field::MonthlyValue, &["value", "valor", "valor_mensal", "mensalidade"])
            .with(Field::ActivationValue, &["valor_ativacao", "ativacao", "taxa_instalacao"])
            .with(Field::City, &["cidade", "municipio"])
            .with(Field::StateCode, &["uf", "estado"])
            .with(Field::ServiceType, &["tipo_servico", "servico"])
            .with(Field::PhysicalMedium, &["meio_fisico", "meio"])
    }
}

/// Position of each recognised field in a header row
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    index: HashMap<Field, usize>,
}

impl HeaderMap {
    /// Map header cells to fields; the first header claiming a field wins
    pub fn resolve<'h>(headers: impl IntoIterator<Item = &'h str>, aliases: &ColumnAliases) -> Self {
        let mut index = HashMap::new();
        for (pos, header) in headers.into_iter().enumerate() {
            match aliases.resolve(header) {
                Some(field) => {
                    if index.contains_key(&field) {
                        tracing::warn!("Header '{}' duplicates column {}, ignoring it", header.trim(), field);
                    } else {
                        index.insert(field, pos);
                    }
                }
                None => tracing::debug!("Ignoring unknown header '{}'", header.trim()),
            }
        }
        Self { index }
    }

    pub fn contains(&self, field: Field) -> bool {
        self.index.contains_key(&field)
    }

    /// Raw cell for a field in a record, if the column exists
    pub fn get<'r>(&self, record: &'r csv::StringRecord, field: Field) -> Option<&'r str> {
        self.index.get(&field).and_then(|pos| record.get(*pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("  UF "), "uf");
        assert_eq!(normalize_header("\u{feff}Link_Dedicado"), "link_dedicado");
    }

    #[test]
    fn test_default_aliases() {
        let aliases = ColumnAliases::default();
        assert_eq!(aliases.resolve("LINK_DEDICADO"), Some(Field::Link));
        assert_eq!(aliases.resolve("link"), Some(Field::Link));
        assert_eq!(aliases.resolve(" Valor "), Some(Field::MonthlyValue));
        assert_eq!(aliases.resolve("uf"), Some(Field::StateCode));
        assert_eq!(aliases.resolve("observacao"), None);
    }

    #[test]
    fn test_canonical_only() {
        let aliases = ColumnAliases::canonical();
        assert_eq!(aliases.resolve("state_code"), Some(Field::StateCode));
        assert_eq!(aliases.resolve("uf"), None);
    }

    #[test]
    fn test_custom_alias() {
        let mut aliases = ColumnAliases::canonical();
        aliases.insert(Field::Link, " Designador ");
        assert_eq!(aliases.resolve("DESIGNADOR"), Some(Field::Link));
        assert_eq!(aliases.resolve("link"), Some(Field::Link));
    }

    #[test]
    fn test_custom_alias_overrides_builtin() {
        let mut aliases = ColumnAliases::default();
        aliases.insert(Field::StateCode, "cidade");
        assert_eq!(aliases.resolve("cidade"), Some(Field::StateCode));
        assert_eq!(aliases.resolve("municipio"), Some(Field::City));
    }

    #[test]
    fn test_custom_alias_takes_name_from_other_field() {
        let mut aliases = ColumnAliases::default();
        aliases.insert(Field::Link, "valor");
        assert_eq!(aliases.resolve("valor"), Some(Field::Link));
        assert_eq!(aliases.resolve("valor_mensal"), Some(Field::MonthlyValue));

        // a header row naming both no longer maps two columns to one field
        let map = HeaderMap::resolve(["valor", "value"], &aliases);
        let record = csv::StringRecord::from(vec!["L-9", "10.00"]);
        assert_eq!(map.get(&record, Field::Link), Some("L-9"));
        assert_eq!(map.get(&record, Field::MonthlyValue), Some("10.00"));
    }

    #[test]
    fn test_header_map_first_wins() {
        let aliases = ColumnAliases::default();
        let record = csv::StringRecord::from(vec!["L1", "10.00", "20.00", "x"]);
        let map = HeaderMap::resolve(["link", "valor", "value", "extra"], &aliases);

        assert!(map.contains(Field::Link));
        assert!(!map.contains(Field::City));
        assert_eq!(map.get(&record, Field::MonthlyValue), Some("10.00"));
        assert_eq!(map.get(&record, Field::City), None);
    }
}
