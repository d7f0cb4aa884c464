use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::analysis::write_report;
use crate::config::{ConnectionConfig, Secret};
use crate::duck::DuckSink;
use crate::process::{extract_rows, load_selected_headers, ResultSet};
use crate::sink::{StorageSink, StoreError};

/// Everything one run of the loader needs.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub secret: Secret,
    pub table: String,
    pub csv_path: PathBuf,
    pub config_path: PathBuf,
    pub headers_path: PathBuf,
    /// Extract only; never touch the store.
    pub dry_run: bool,
    pub report_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The score sheet was missing or had no data rows.
    NothingToLoad,
    DryRun(ResultSet),
    Loaded { table: String, rows: usize },
}

/// Hand an extracted result set to `sink`: the schema must exist, the table is
/// created if absent, then every row goes in as a single batch.
pub fn persist<S: StorageSink>(
    sink: &mut S,
    table: &str,
    result: &ResultSet,
) -> Result<usize, StoreError> {
    if !sink.schema_exists()? {
        return Err(StoreError::SchemaMissing {
            schema: sink.schema().to_string(),
        });
    }
    if !sink.ensure_table(table, &result.columns)? {
        return Err(StoreError::TableMissing {
            table: table.to_string(),
        });
    }
    sink.insert(table, result)
}

/// Run one load: read config and selection, extract, optionally report, persist.
#[tracing::instrument(level = "info", skip(req), fields(table = %req.table, csv = %req.csv_path.display()))]
pub fn run(req: &LoadRequest) -> Result<LoadOutcome> {
    let config = ConnectionConfig::load(&req.config_path)?;
    info!(
        host = %config.host,
        user = %config.user,
        database = %config.database,
        port = config.port,
        "loaded connection config"
    );

    let selected = load_selected_headers(&req.headers_path)?;
    info!(selected = selected.len(), "loaded header selection");

    let result = extract_rows(&req.csv_path, &selected);

    if let Some(path) = &req.report_path {
        write_report(&result, path)?;
    }

    if result.is_empty() {
        warn!("no data rows extracted, nothing to load");
        return Ok(LoadOutcome::NothingToLoad);
    }

    if req.dry_run {
        return Ok(LoadOutcome::DryRun(result));
    }

    let mut sink = DuckSink::open(&config, &req.secret)
        .with_context(|| format!("opening store {}", config.path.display()))?;
    let rows = persist(&mut sink, &req.table, &result)?;

    Ok(LoadOutcome::Loaded {
        table: req.table.clone(),
        rows,
    })
}
