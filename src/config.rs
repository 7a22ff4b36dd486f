use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use crate::{Error, Result};
use crate::ingest::header::normalize_header;
use crate::ingest::{ColumnAliases, DecimalSeparator, IngestConfig};
use crate::record::{Field, KeyScheme};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LinkpriceConfig {
    pub database: PathBuf,
    pub key_scheme: KeyScheme,
    pub decimal_separator: DecimalSeparator,
    pub delimiter: String,
    /// Imported by `setup` when present
    pub seed_file: PathBuf,
    /// Extra source header names per canonical column
    pub column_aliases: BTreeMap<String, Vec<String>>,
}

impl Default for LinkpriceConfig {
    fn default() -> Self {
        Self {
            database: default_database_path(),
            key_scheme: KeyScheme::default(),
            decimal_separator: DecimalSeparator::default(),
            delimiter: ",".to_string(),
            seed_file: PathBuf::from("dados.csv"),
            column_aliases: BTreeMap::new(),
        }
    }
}

impl LinkpriceConfig {
    /// Ingestion settings: default aliases extended by the configured ones.
    ///
    /// A configured alias overrides a built-in one with the same name. The
    /// same name configured for two columns is an error.
    pub fn ingest_config(&self) -> Result<IngestConfig> {
        let mut aliases = ColumnAliases::default();
        let mut claimed: BTreeMap<String, Field> = BTreeMap::new();
        for (canonical, names) in &self.column_aliases {
            let field: Field = canonical
                .parse()
                .map_err(|_| Error::Config(format!("Unknown column in column_aliases: {}", canonical)))?;
            for name in names {
                let key = normalize_header(name);
                if let Some(previous) = claimed.insert(key.clone(), field) {
                    if previous != field {
                        return Err(Error::Config(format!(
                            "Alias '{}' is configured for both {} and {}",
                            key, previous, field
                        )));
                    }
                }
                aliases.insert(field, name);
            }
        }

        Ok(IngestConfig {
            column_aliases: aliases,
            decimal_separator: self.decimal_separator,
            delimiter: parse_delimiter(&self.delimiter)?,
        })
    }
}

fn parse_delimiter(raw: &str) -> Result<u8> {
    match raw.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ if raw == "\\t" => Ok(b'\t'),
        _ => Err(Error::Config(format!("Delimiter must be a single ASCII character, got {:?}", raw))),
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("linkprice.toml")
}

pub fn default_database_path() -> PathBuf {
    PathBuf::from("precos.db")
}

/// Load the config file; `None` when it does not exist
pub fn load_config(path: Option<&Path>) -> Result<Option<LinkpriceConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: LinkpriceConfig = toml::from_str(&contents)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &LinkpriceConfig, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::Config(format!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        )));
    }

    let contents = toml::to_string_pretty(config).map_err(|e| Error::Config(e.to_string()))?;
    std::fs::write(path, contents)?;
    Ok(())
}
