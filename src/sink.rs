use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::process::ResultSet;

/// Name of the identifier column in every output table.
pub const ID_COLUMN: &str = "student_id";

static IDENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex"));

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("schema `{schema}` does not exist")]
    SchemaMissing { schema: String },

    #[error("table `{table}` does not exist")]
    TableMissing { table: String },

    #[error("`{name}` is not a valid SQL identifier")]
    InvalidIdentifier { name: String },

    #[error("no scorable columns to create `{table}` with")]
    EmptySelection { table: String },

    #[error("database error: {0}")]
    Database(#[from] duckdb::Error),
}

impl StoreError {
    /// Stable reason code for operator messages.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::SchemaMissing { .. } => "schema_missing",
            Self::TableMissing { .. } => "table_missing",
            Self::InvalidIdentifier { .. } => "invalid_identifier",
            Self::EmptySelection { .. } => "empty_selection",
            Self::Database(_) => "database_error",
        }
    }
}

/// Where normalized score rows end up.
pub trait StorageSink {
    /// Schema tables are resolved in.
    fn schema(&self) -> &str;

    /// Whether [`StorageSink::schema`] exists.
    fn schema_exists(&self) -> Result<bool, StoreError>;

    fn table_exists(&self, table: &str) -> Result<bool, StoreError>;

    /// Create `table` with the identifier column plus one score column per
    /// entry of `columns`, unless it already exists. Returns whether the table
    /// is usable afterwards.
    fn ensure_table(&mut self, table: &str, columns: &[String]) -> Result<bool, StoreError>;

    /// Insert every row of `rows` in order, as one unit. Returns the row count.
    fn insert(&mut self, table: &str, rows: &ResultSet) -> Result<usize, StoreError>;
}

/// Validate `name` for interpolation into SQL and return it double-quoted.
pub fn quote_ident(name: &str) -> Result<String, StoreError> {
    if !IDENT_RE.is_match(name) {
        return Err(StoreError::InvalidIdentifier {
            name: name.to_string(),
        });
    }
    Ok(format!("\"{}\"", name))
}

fn score_columns(columns: &[String]) -> Result<Vec<String>, StoreError> {
    columns
        .iter()
        .map(|c| {
            if c.eq_ignore_ascii_case(ID_COLUMN) {
                return Err(StoreError::InvalidIdentifier { name: c.clone() });
            }
            quote_ident(c)
        })
        .collect()
}

pub fn create_table_sql(schema: &str, table: &str, columns: &[String]) -> Result<String, StoreError> {
    if columns.is_empty() {
        return Err(StoreError::EmptySelection {
            table: table.to_string(),
        });
    }
    let mut defs = vec![format!("{} VARCHAR PRIMARY KEY", quote_ident(ID_COLUMN)?)];
    defs.extend(
        score_columns(columns)?
            .into_iter()
            .map(|c| format!("{} UINTEGER", c)),
    );
    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {}.{} ({})",
        quote_ident(schema)?,
        quote_ident(table)?,
        defs.join(", ")
    ))
}

pub fn insert_sql(schema: &str, table: &str, columns: &[String]) -> Result<String, StoreError> {
    let mut names = vec![quote_ident(ID_COLUMN)?];
    names.extend(score_columns(columns)?);
    let placeholders = vec!["?"; names.len()].join(", ");
    Ok(format!(
        "INSERT INTO {}.{} ({}) VALUES ({})",
        quote_ident(schema)?,
        quote_ident(table)?,
        names.join(", "),
        placeholders
    ))
}
