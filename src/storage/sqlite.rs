//! SQLite storage implementation

use std::path::{Path, PathBuf};
use rusqlite::{Connection, ErrorCode, OptionalExtension, params, params_from_iter};
use serde::Serialize;
use crate::{Error, Result};
use crate::ingest::normalize::fold_upper;
use crate::record::{Field, KeyScheme, PriceRecord};
use super::schema::{self, COLUMNS, ORDER_BY, TABLE};

/// SQLite-backed storage for price records.
///
/// Holds no connection: every operation opens one, runs a single
/// transaction and closes it.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
    scheme: KeyScheme,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>, scheme: KeyScheme) -> Self {
        Self { path: path.into(), scheme }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn scheme(&self) -> KeyScheme {
        self.scheme
    }

    fn connect(&self) -> Result<Connection> {
        Ok(Connection::open(&self.path)?)
    }

    /// Connection to an existing database that already holds the table.
    ///
    /// `None` means "nothing stored yet"; no file is created.
    fn open_existing(&self) -> Result<Option<Connection>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let conn = self.connect()?;
        if !table_exists(&conn)? {
            return Ok(None);
        }
        Ok(Some(conn))
    }

    // ========== Schema ==========

    /// Create the table, its unique key and indexes if absent.
    ///
    /// A file that is not a SQLite database is moved to `<path>.corrupt`
    /// and replaced by a fresh one.
    pub fn ensure_schema(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        match self.create_schema() {
            Err(Error::Storage(e)) if is_not_a_database(&e) => {
                let aside = corrupt_path(&self.path);
                tracing::warn!(
                    "{} is not a SQLite database, moving it to {} and starting fresh",
                    self.path.display(),
                    aside.display()
                );
                std::fs::rename(&self.path, &aside)?;
                self.create_schema()
            }
            other => other,
        }
    }

    /// Fails with `Error::Config` when an existing table was created under
    /// the other key scheme
    fn create_schema(&self) -> Result<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        for stmt in schema::all_schema_statements(self.scheme) {
            tx.execute(stmt, [])?;
        }

        let stored = stored_scheme(&tx)?;
        if stored != Some(self.scheme) {
            return Err(Error::Config(format!(
                "database {} was created with key scheme {}, but key_scheme is {}",
                self.path.display(),
                stored.map_or_else(|| "unknown".to_string(), |s| s.to_string()),
                self.scheme
            )));
        }
        tx.commit()?;
        Ok(())
    }

    // ========== Writes ==========

    /// Insert each row, or overwrite the row sharing its key.
    ///
    /// The whole batch is one transaction: on any failure nothing is kept.
    pub fn upsert_many(&self, rows: &[PriceRecord]) -> Result<usize> {
        self.ensure_schema()?;
        if rows.is_empty() {
            return Ok(0);
        }

        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare(&schema::upsert_statement(self.scheme))?;
            for row in rows {
                written += stmt.execute(params![
                    row.link,
                    row.speed,
                    row.ip_block,
                    row.monthly_value,
                    row.activation_value,
                    row.city,
                    row.state_code,
                    row.service_type,
                    row.physical_medium,
                ])?;
            }
        }
        tx.commit()?;

        tracing::debug!("Upserted {} rows into {}", written, self.path.display());
        Ok(written)
    }

    /// Delete rows matching every filter that carries a value
    pub fn delete_where(&self, filter: &DeleteFilter) -> Result<usize> {
        let clauses = filter.clauses();
        if clauses.is_empty() && !filter.confirm_all {
            return Err(Error::UnscopedDelete);
        }

        let Some(mut conn) = self.open_existing()? else {
            return Ok(0);
        };

        let mut sql = format!("DELETE FROM {TABLE} WHERE 1=1");
        for (field, _) in &clauses {
            sql.push_str(&format!(" AND {} = ?", field.as_str()));
        }

        let tx = conn.transaction()?;
        let affected = tx.execute(&sql, params_from_iter(clauses.iter().map(|(_, v)| v)))?;
        tx.commit()?;

        tracing::info!("Deleted {} rows ({})", affected, filter);
        Ok(affected)
    }

    // ========== Reads ==========

    /// Every stored row, ordered by state, city, service, link and speed
    pub fn load_all(&self) -> Result<Vec<PriceRecord>> {
        let Some(conn) = self.open_existing()? else {
            return Ok(Vec::new());
        };

        let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM {TABLE} {ORDER_BY}"))?;
        let records = stmt
            .query_map([], row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    /// Unique non-null values of a text column, ascending
    pub fn distinct_values(&self, field: Field) -> Result<Vec<String>> {
        if !field.is_text() {
            return Err(Error::InvalidColumn(format!("{} is not a text column", field)));
        }
        let Some(conn) = self.open_existing()? else {
            return Ok(Vec::new());
        };

        let column = field.as_str();
        let mut stmt = conn.prepare(&format!(
            "SELECT DISTINCT {column} FROM {TABLE} WHERE {column} IS NOT NULL ORDER BY {column}"
        ))?;
        let values = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(values)
    }

    /// Unique speeds, ascending
    pub fn distinct_speeds(&self) -> Result<Vec<i64>> {
        let Some(conn) = self.open_existing()? else {
            return Ok(Vec::new());
        };

        let mut stmt = conn.prepare(&format!(
            "SELECT DISTINCT speed FROM {TABLE} WHERE speed IS NOT NULL ORDER BY speed"
        ))?;
        let speeds = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(speeds)
    }

    /// Count all rows
    pub fn count(&self) -> Result<usize> {
        let Some(conn) = self.open_existing()? else {
            return Ok(0);
        };
        let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {TABLE}"), [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            rows: self.count()?,
            states: self.distinct_values(Field::StateCode)?.len(),
            cities: self.distinct_values(Field::City)?.len(),
            service_types: self.distinct_values(Field::ServiceType)?.len(),
        })
    }
}

fn table_exists(conn: &Connection) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [TABLE],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Key scheme of the stored table, read from its primary key column
fn stored_scheme(conn: &Connection) -> Result<Option<KeyScheme>> {
    let pk: Option<String> = conn
        .query_row(
            "SELECT name FROM pragma_table_info(?1) WHERE pk = 1",
            [TABLE],
            |row| row.get(0),
        )
        .optional()?;
    Ok(match pk.as_deref() {
        Some("link") => Some(KeyScheme::Link),
        Some("id") => Some(KeyScheme::Composite),
        _ => None,
    })
}

fn is_not_a_database(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::NotADatabase)
}

fn corrupt_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".corrupt");
    PathBuf::from(name)
}

fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<PriceRecord> {
    Ok(PriceRecord {
        link: row.get(0)?,
        speed: row.get(1)?,
        ip_block: row.get(2)?,
        monthly_value: row.get(3)?,
        activation_value: row.get(4)?,
        city: row.get(5)?,
        state_code: row.get(6)?,
        service_type: row.get(7)?,
        physical_medium: row.get(8)?,
    })
}

/// Scope of a delete.
///
/// Blank fields are ignored. A filter with no values deletes nothing
/// unless `confirm_all` is set.
#[derive(Debug, Clone, Default)]
pub struct DeleteFilter {
    pub state_code: Option<String>,
    pub city: Option<String>,
    pub service_type: Option<String>,
    /// Exact identifying link
    pub link: Option<String>,
    pub confirm_all: bool,
}

impl DeleteFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state_code(mut self, value: impl Into<String>) -> Self {
        self.state_code = Some(value.into());
        self
    }

    pub fn city(mut self, value: impl Into<String>) -> Self {
        self.city = Some(value.into());
        self
    }

    pub fn service_type(mut self, value: impl Into<String>) -> Self {
        self.service_type = Some(value.into());
        self
    }

    pub fn link(mut self, value: impl Into<String>) -> Self {
        self.link = Some(value.into());
        self
    }

    /// Allow an empty filter to delete every row
    pub fn confirm_all(mut self) -> Self {
        self.confirm_all = true;
        self
    }

    /// Column/value pairs that carry a value, normalized like ingested data
    fn clauses(&self) -> Vec<(Field, String)> {
        let candidates = [
            (Field::StateCode, self.state_code.as_deref().map(fold_upper)),
            (Field::City, self.city.as_deref().map(fold_upper)),
            (Field::ServiceType, self.service_type.as_deref().map(|v| v.trim().to_string())),
            (Field::Link, self.link.as_deref().map(|v| v.trim().to_string())),
        ];
        candidates
            .into_iter()
            .filter_map(|(field, value)| value.filter(|v| !v.is_empty()).map(|v| (field, v)))
            .collect()
    }

    pub fn is_scoped(&self) -> bool {
        !self.clauses().is_empty()
    }
}

impl std::fmt::Display for DeleteFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let clauses = self.clauses();
        if clauses.is_empty() {
            return write!(f, "all rows");
        }
        let parts: Vec<String> = clauses.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Database statistics
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub rows: usize,
    pub states: usize,
    pub cities: usize,
    pub service_types: usize,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Rows: {}", self.rows)?;
        writeln!(f, "  States: {}", self.states)?;
        writeln!(f, "  Cities: {}", self.cities)?;
        write!(f, "  Service types: {}", self.service_types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_store(scheme: KeyScheme) -> (TempDir, RecordStore) {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::new(dir.path().join("precos.db"), scheme);
        store.ensure_schema().unwrap();
        (dir, store)
    }

    fn sample(link: &str, state: &str, city: &str, service: &str, speed: i64) -> PriceRecord {
        PriceRecord::new(link, city, state, service)
            .with_speed(speed)
            .with_monthly_value(100.0)
    }

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let (_dir, store) = temp_store(KeyScheme::Composite);
        store.ensure_schema().unwrap();
        store.ensure_schema().unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_ensure_schema_creates_parent_dir() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::new(dir.path().join("nested").join("precos.db"), KeyScheme::Link);
        store.ensure_schema().unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_key_scheme_mismatch_is_a_config_error() {
        let (_dir, link_store) = temp_store(KeyScheme::Link);
        link_store.upsert_many(&[sample("L1", "SP", "SAO PAULO", "IP", 100)]).unwrap();

        let composite = RecordStore::new(link_store.path(), KeyScheme::Composite);
        assert!(matches!(composite.ensure_schema(), Err(Error::Config(msg)) if msg.contains("link")));
        let result = composite.upsert_many(&[sample("L2", "SP", "SAO PAULO", "IP", 100)]);
        assert!(matches!(result, Err(Error::Config(_))));

        // the existing rows are untouched and still readable
        assert_eq!(composite.count().unwrap(), 1);
        link_store.ensure_schema().unwrap();
    }

    #[test]
    fn test_corrupt_file_is_replaced() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("precos.db");
        std::fs::write(&path, vec![b'x'; 4096]).unwrap();

        let store = RecordStore::new(&path, KeyScheme::Composite);
        store.ensure_schema().unwrap();

        assert!(dir.path().join("precos.db.corrupt").exists());
        assert!(store.load_all().unwrap().is_empty());
        store.upsert_many(&[sample("A", "SP", "SAO PAULO", "IP", 100)]).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_reads_on_missing_database_are_empty() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::new(dir.path().join("absent.db"), KeyScheme::Composite);

        assert!(store.load_all().unwrap().is_empty());
        assert!(store.distinct_values(Field::StateCode).unwrap().is_empty());
        assert!(store.distinct_speeds().unwrap().is_empty());
        assert_eq!(store.count().unwrap(), 0);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_reads_on_missing_table_are_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("other.db");
        Connection::open(&path)
            .unwrap()
            .execute("CREATE TABLE unrelated (x INTEGER)", [])
            .unwrap();

        let store = RecordStore::new(&path, KeyScheme::Link);
        assert!(store.load_all().unwrap().is_empty());
        assert_eq!(store.delete_where(&DeleteFilter::new().state_code("SP")).unwrap(), 0);
    }

    #[test]
    fn test_upsert_replaces_whole_row() {
        let (_dir, store) = temp_store(KeyScheme::Composite);
        let original = sample("A", "SP", "SAO PAULO", "IP", 100)
            .with_activation_value(50.0)
            .with_ip_block("/29");
        store.upsert_many(&[original]).unwrap();

        let replacement = sample("A", "SP", "SAO PAULO", "IP", 100).with_monthly_value(120.0);
        store.upsert_many(&[replacement.clone()]).unwrap();

        let rows = store.load_all().unwrap();
        assert_eq!(rows, vec![replacement]);
        assert_eq!(rows[0].activation_value, None);
        assert_eq!(rows[0].ip_block, None);
    }

    #[test]
    fn test_composite_key_distinguishes_speed() {
        let (_dir, store) = temp_store(KeyScheme::Composite);
        store
            .upsert_many(&[
                sample("A", "SP", "SAO PAULO", "IP", 100),
                sample("A", "SP", "SAO PAULO", "IP", 200),
            ])
            .unwrap();
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_link_key_collapses_on_link() {
        let (_dir, store) = temp_store(KeyScheme::Link);
        store
            .upsert_many(&[
                sample("A", "SP", "SAO PAULO", "IP", 100),
                sample("A", "RJ", "RIO DE JANEIRO", "IP", 200),
            ])
            .unwrap();

        let rows = store.load_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].state_code, "RJ");
    }

    #[test]
    fn test_failed_batch_rolls_back() {
        let (_dir, store) = temp_store(KeyScheme::Composite);
        store.upsert_many(&[sample("A", "SP", "SAO PAULO", "IP", 100)]).unwrap();

        // speed is NOT NULL under the composite key
        let bad = PriceRecord::new("C", "CAMPINAS", "SP", "IP");
        let result = store.upsert_many(&[sample("B", "RJ", "NITEROI", "IP", 50), bad]);

        assert!(matches!(result, Err(Error::Storage(_))));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_delete_where_state() {
        let (_dir, store) = temp_store(KeyScheme::Composite);
        store
            .upsert_many(&[
                sample("A", "SP", "SAO PAULO", "IP", 100),
                sample("B", "SP", "CAMPINAS", "MPLS", 100),
                sample("C", "RJ", "NITEROI", "IP", 100),
            ])
            .unwrap();

        let removed = store.delete_where(&DeleteFilter::new().state_code("SP")).unwrap();
        assert_eq!(removed, 2);

        let rows = store.load_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].link, "C");
    }

    #[test]
    fn test_delete_where_conjunction_and_normalization() {
        let (_dir, store) = temp_store(KeyScheme::Composite);
        store
            .upsert_many(&[
                sample("A", "SP", "SAO PAULO", "IP", 100),
                sample("B", "SP", "SAO PAULO", "MPLS", 100),
            ])
            .unwrap();

        let filter = DeleteFilter::new().state_code("sp").city("São Paulo").service_type("IP");
        assert_eq!(store.delete_where(&filter).unwrap(), 1);
        assert_eq!(store.load_all().unwrap()[0].link, "B");
    }

    #[test]
    fn test_delete_by_link() {
        let (_dir, store) = temp_store(KeyScheme::Link);
        store
            .upsert_many(&[
                sample("A", "SP", "SAO PAULO", "IP", 100),
                sample("B", "SP", "SAO PAULO", "IP", 100),
            ])
            .unwrap();

        assert_eq!(store.delete_where(&DeleteFilter::new().link("A")).unwrap(), 1);
        assert_eq!(store.delete_where(&DeleteFilter::new().link("missing")).unwrap(), 0);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_unscoped_delete_is_rejected() {
        let (_dir, store) = temp_store(KeyScheme::Composite);
        store.upsert_many(&[sample("A", "SP", "SAO PAULO", "IP", 100)]).unwrap();

        let blank = DeleteFilter::new().state_code("  ").city("");
        assert!(matches!(store.delete_where(&blank), Err(Error::UnscopedDelete)));
        assert_eq!(store.count().unwrap(), 1);

        assert_eq!(store.delete_where(&DeleteFilter::new().confirm_all()).unwrap(), 1);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_distinct_values_sorted_unique() {
        let (_dir, store) = temp_store(KeyScheme::Composite);
        store
            .upsert_many(&[
                sample("A", "SP", "SAO PAULO", "IP", 100),
                sample("B", "BA", "SALVADOR", "IP", 100),
                sample("C", "SP", "CAMPINAS", "IP", 300),
                sample("D", "AM", "MANAUS", "IP", 50),
            ])
            .unwrap();

        let states = store.distinct_values(Field::StateCode).unwrap();
        assert_eq!(states, vec!["AM", "BA", "SP"]);
        assert!(states.windows(2).all(|w| w[0] < w[1]));

        assert_eq!(store.distinct_speeds().unwrap(), vec![50, 100, 300]);
        assert!(store.distinct_values(Field::PhysicalMedium).unwrap().is_empty());
    }

    #[test]
    fn test_distinct_values_rejects_numeric_column() {
        let (_dir, store) = temp_store(KeyScheme::Composite);
        assert!(matches!(
            store.distinct_values(Field::MonthlyValue),
            Err(Error::InvalidColumn(_))
        ));
    }

    #[test]
    fn test_stats() {
        let (_dir, store) = temp_store(KeyScheme::Composite);
        store
            .upsert_many(&[
                sample("A", "SP", "SAO PAULO", "IP", 100),
                sample("B", "SP", "CAMPINAS", "MPLS", 100),
            ])
            .unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.rows, 2);
        assert_eq!(stats.states, 1);
        assert_eq!(stats.cities, 2);
        assert_eq!(stats.service_types, 2);
    }
}
