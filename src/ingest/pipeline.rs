//! CSV → PriceRecord → upsert pipeline

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use crate::{Error, Result};
use crate::record::{Field, PriceRecord};
use crate::storage::RecordStore;
use super::header::{ColumnAliases, HeaderMap};
use super::normalize::{clean_text, fold_upper, parse_money, parse_speed, DecimalSeparator};
use super::report::{IngestReport, RejectReason};

/// How source files are read and coerced
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub column_aliases: ColumnAliases,
    pub decimal_separator: DecimalSeparator,
    /// CSV field delimiter
    pub delimiter: u8,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            column_aliases: ColumnAliases::default(),
            decimal_separator: DecimalSeparator::default(),
            delimiter: b',',
        }
    }
}

/// Reads pricing CSVs and writes them to a [`RecordStore`] as one batch
pub struct Ingestor<'a> {
    store: &'a RecordStore,
    config: IngestConfig,
}

impl<'a> Ingestor<'a> {
    pub fn new(store: &'a RecordStore, config: IngestConfig) -> Self {
        Self { store, config }
    }

    /// Ingest a CSV file. A missing file writes nothing.
    pub fn ingest_path(&self, path: &Path) -> Result<IngestReport> {
        if !path.is_file() {
            return Err(Error::InputNotFound(path.to_path_buf()));
        }
        let file = File::open(path)?;
        let report = self.ingest_reader(BufReader::new(file))?;
        tracing::info!(
            "Imported {}: {} accepted, {} rejected",
            path.display(),
            report.accepted,
            report.rejected_total()
        );
        Ok(report)
    }

    /// Ingest CSV data from any reader
    pub fn ingest_reader<R: Read>(&self, reader: R) -> Result<IngestReport> {
        let (records, mut report) = self.parse(reader)?;
        report.written = self.store.upsert_many(&records)?;
        Ok(report)
    }

    /// Validate and normalize rows without touching the store
    pub fn parse<R: Read>(&self, reader: R) -> Result<(Vec<PriceRecord>, IngestReport)> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::None)
            .delimiter(self.config.delimiter)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let columns = HeaderMap::resolve(headers.iter(), &self.config.column_aliases);
        if !columns.contains(Field::Link) {
            return Err(Error::MissingColumn(Field::Link.to_string()));
        }

        let mut report = IngestReport::default();
        let mut records = Vec::new();

        for (idx, result) in rdr.records().enumerate() {
            // header is line 1
            let line = idx + 2;
            report.rows_read += 1;

            let row = match result {
                Ok(row) => row,
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    tracing::debug!("Line {}: malformed record: {}", line, e);
                    report.reject(RejectReason::MalformedRecord);
                    continue;
                }
            };

            match self.coerce(&columns, &row, &mut report) {
                Ok(record) => {
                    records.push(record);
                    report.accepted += 1;
                }
                Err(reason) => {
                    tracing::debug!("Line {}: dropped ({})", line, reason);
                    report.reject(reason);
                }
            }
        }

        Ok((records, report))
    }

    fn coerce(
        &self,
        columns: &HeaderMap,
        row: &csv::StringRecord,
        report: &mut IngestReport,
    ) -> std::result::Result<PriceRecord, RejectReason> {
        let scheme = self.store.scheme();
        let cell = |field: Field| columns.get(row, field).map(str::trim).filter(|v| !v.is_empty());

        let link = cell(Field::Link).ok_or(RejectReason::MissingKey)?;
        let city = cell(Field::City).ok_or(RejectReason::MissingField)?;
        let state_code = cell(Field::StateCode).ok_or(RejectReason::MissingField)?;
        let service_type = cell(Field::ServiceType).ok_or(RejectReason::MissingField)?;

        let speed = match cell(Field::Speed) {
            None if scheme.required_fields().contains(&Field::Speed) => {
                return Err(RejectReason::MissingField);
            }
            None => None,
            Some(raw) => match parse_speed(raw) {
                Some(speed) => Some(speed),
                None if scheme.is_key(Field::Speed) => return Err(RejectReason::UnparseableValue),
                None => {
                    report.nulled_values += 1;
                    None
                }
            },
        };

        let mut money = |field: Field| {
            let raw = cell(field)?;
            let value = parse_money(raw, self.config.decimal_separator);
            if value.is_none() {
                report.nulled_values += 1;
            }
            value
        };
        let monthly_value = money(Field::MonthlyValue);
        let activation_value = money(Field::ActivationValue);

        Ok(PriceRecord {
            link: link.to_string(),
            speed,
            ip_block: cell(Field::IpBlock).and_then(clean_text),
            monthly_value,
            activation_value,
            city: fold_upper(city),
            state_code: fold_upper(state_code),
            service_type: service_type.to_string(),
            physical_medium: cell(Field::PhysicalMedium).and_then(clean_text),
        })
    }
}
