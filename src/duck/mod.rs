use duckdb::{params, params_from_iter, types::Value, Connection};
use std::time::Instant;
use tracing::{debug, info};

use crate::config::{ConnectionConfig, Secret};
use crate::process::ResultSet;
use crate::sink::{create_table_sql, insert_sql, quote_ident, StorageSink, StoreError};

/// [`StorageSink`] backed by an embedded DuckDB database.
pub struct DuckSink {
    conn: Connection,
    schema: String,
}

impl DuckSink {
    /// Open the database file named by `cfg.path`, creating it if it doesn't exist.
    /// Tables are resolved inside `cfg.schema()`.
    pub fn open(cfg: &ConnectionConfig, secret: &Secret) -> Result<Self, StoreError> {
        debug!(
            host = %cfg.host,
            user = %cfg.user,
            port = cfg.port,
            credential = ?secret,
            "embedded store ignores network credentials"
        );
        let conn = Connection::open(&cfg.path)?;
        info!(path = %cfg.path.display(), schema = cfg.schema(), "opened store");
        Ok(Self::with_connection(conn, cfg.schema()))
    }

    /// Open a DuckDB in-memory database.
    pub fn open_in_memory(schema: &str) -> Result<Self, StoreError> {
        Ok(Self::with_connection(Connection::open_in_memory()?, schema))
    }

    pub fn with_connection(conn: Connection, schema: &str) -> Self {
        DuckSink {
            conn,
            schema: schema.to_string(),
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl StorageSink for DuckSink {
    fn schema(&self) -> &str {
        &self.schema
    }

    fn schema_exists(&self) -> Result<bool, StoreError> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM information_schema.schemata WHERE schema_name = ?",
            params![self.schema],
            |r| r.get(0),
        )?;
        Ok(n > 0)
    }

    fn table_exists(&self, table: &str) -> Result<bool, StoreError> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = ? AND table_name = ?",
            params![self.schema, table],
            |r| r.get(0),
        )?;
        Ok(n > 0)
    }

    fn ensure_table(&mut self, table: &str, columns: &[String]) -> Result<bool, StoreError> {
        if !self.schema_exists()? {
            return Err(StoreError::SchemaMissing {
                schema: self.schema.clone(),
            });
        }
        let sql = create_table_sql(&self.schema, table, columns)?;
        debug!(%sql, "ensuring table");
        self.conn.execute(&sql, [])?;
        let usable = self.table_exists(table)?;
        if usable {
            info!(table, columns = columns.len(), "table ready");
        }
        Ok(usable)
    }

    fn insert(&mut self, table: &str, rows: &ResultSet) -> Result<usize, StoreError> {
        quote_ident(table)?;
        if !self.table_exists(table)? {
            return Err(StoreError::TableMissing {
                table: table.to_string(),
            });
        }
        let sql = insert_sql(&self.schema, table, &rows.columns)?;
        let start = Instant::now();

        // dropped without commit on any error, which rolls the batch back
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&sql)?;
            for row in &rows.rows {
                let mut values = Vec::with_capacity(rows.columns.len() + 1);
                values.push(Value::Text(row.id.clone()));
                for slot in 0..rows.columns.len() {
                    values.push(row.get(slot).map(Value::UInt).unwrap_or(Value::Null));
                }
                stmt.execute(params_from_iter(values))?;
            }
        }
        tx.commit()?;

        info!(table, rows = rows.rows.len(), elapsed = ?start.elapsed(), "inserted batch");
        Ok(rows.rows.len())
    }
}
