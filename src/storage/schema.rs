//! Database schema definitions

use crate::record::KeyScheme;

/// Name of the single pricing table
pub const TABLE: &str = "price_records";

/// Link-keyed table: the dedicated link is the primary key
pub const CREATE_LINK_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS price_records (
    link TEXT PRIMARY KEY NOT NULL,
    speed INTEGER,
    ip_block TEXT,
    monthly_value REAL,
    activation_value REAL,
    city TEXT NOT NULL,
    state_code TEXT NOT NULL,
    service_type TEXT NOT NULL,
    physical_medium TEXT
)
"#;

/// Composite-keyed table: every key column is NOT NULL so that the
/// UNIQUE constraint actually collides on re-import
pub const CREATE_COMPOSITE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS price_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    link TEXT NOT NULL,
    speed INTEGER NOT NULL,
    ip_block TEXT,
    monthly_value REAL,
    activation_value REAL,
    city TEXT NOT NULL,
    state_code TEXT NOT NULL,
    service_type TEXT NOT NULL,
    physical_medium TEXT,
    UNIQUE(city, state_code, link, speed, service_type)
)
"#;

/// Indexes backing the filter and delete columns
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_price_records_state ON price_records(state_code)",
    "CREATE INDEX IF NOT EXISTS idx_price_records_city ON price_records(city)",
    "CREATE INDEX IF NOT EXISTS idx_price_records_service ON price_records(service_type)",
];

/// Column list shared by every SELECT and INSERT
pub const COLUMNS: &str =
    "link, speed, ip_block, monthly_value, activation_value, city, state_code, service_type, physical_medium";

/// Deterministic row order for reads
pub const ORDER_BY: &str = "ORDER BY state_code, city, service_type, link, speed";

/// All schema creation statements for a key scheme
pub fn all_schema_statements(scheme: KeyScheme) -> Vec<&'static str> {
    let mut stmts = vec![match scheme {
        KeyScheme::Link => CREATE_LINK_TABLE,
        KeyScheme::Composite => CREATE_COMPOSITE_TABLE,
    }];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}

/// Upsert statement for a key scheme.
///
/// Updates in place on conflict, so every non-key column is overwritten
/// (NULL included) and the stored row keeps its rowid.
pub fn upsert_statement(scheme: KeyScheme) -> String {
    let conflict: Vec<&str> = scheme.key_fields().iter().map(|f| f.as_str()).collect();
    let updates: Vec<String> = crate::record::Field::all()
        .iter()
        .filter(|f| !scheme.is_key(**f))
        .map(|f| format!("{0} = excluded.{0}", f.as_str()))
        .collect();

    format!(
        "INSERT INTO {TABLE} ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
         ON CONFLICT({}) DO UPDATE SET {}",
        conflict.join(", "),
        updates.join(", "),
    )
}
