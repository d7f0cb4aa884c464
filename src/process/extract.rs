use serde::Serialize;
use std::{collections::HashSet, path::Path};
use tracing::{debug, info, warn};

use super::utils::{parse_cell, score_or_zero, Cell};
use super::{load_score_csv, RawTable};
use crate::normalize::normalize_counts;

/// One normalized score. `slot` indexes [`ResultSet::columns`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Score {
    pub slot: usize,
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRow {
    /// Column 0 of the data line.
    pub id: String,
    /// In selection order. A score the line is too short for is omitted, so
    /// this may be shorter than the column list.
    pub scores: Vec<Score>,
}

impl ResultRow {
    pub fn values(&self) -> Vec<u32> {
        self.scores.iter().map(|s| s.value).collect()
    }

    /// Value for output column `slot`, if this row has one.
    pub fn get(&self, slot: usize) -> Option<u32> {
        self.scores.iter().find(|s| s.slot == slot).map(|s| s.value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultSet {
    /// Output column names, in selection order. Only names that resolved to a
    /// scorable column with a maximum are listed.
    pub columns: Vec<String>,
    pub rows: Vec<ResultRow>,
}

impl ResultSet {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A selected column whose maximum has been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ResolvedColumn {
    name: String,
    position: usize,
    maximum: u32,
}

/// Map selected names to positions, keep selection order, resolve maxima.
fn resolve_columns(table: &RawTable, selected: &[String]) -> Vec<ResolvedColumn> {
    let mut seen = HashSet::new();
    let mut resolved = Vec::with_capacity(selected.len());

    for name in selected {
        let Some(position) = table.position(name) else {
            debug!(header = %name, "selected header not in score sheet, skipping");
            continue;
        };
        if !seen.insert(position) {
            warn!(header = %name, "header selected more than once, keeping first");
            continue;
        }
        // column 0 holds the identifier and is never scored
        if position == 0 {
            debug!(header = %name, "identifier column cannot be scored, skipping");
            continue;
        }
        let Some(raw_max) = table.max_scores.get(position) else {
            debug!(header = %name, position, "no maximum score for column, skipping");
            continue;
        };
        let maximum = score_or_zero(raw_max, &format!("max/{}", name));
        resolved.push(ResolvedColumn {
            name: name.clone(),
            position,
            maximum,
        });
    }
    resolved
}

/// Normalize every data row of an already-loaded table.
pub fn extract_from_table(table: &RawTable, selected: &[String]) -> ResultSet {
    let columns = resolve_columns(table, selected);

    let rows = table
        .rows
        .iter()
        .filter(|row| !row.is_empty())
        .map(|row| {
            let id = row[0].clone();
            let mut scores = Vec::with_capacity(columns.len());
            for (slot, col) in columns.iter().enumerate() {
                let Some(raw) = row.get(col.position) else {
                    continue;
                };
                let obtained = match parse_cell(raw) {
                    Cell::Count(v) => v,
                    Cell::Blank | Cell::Malformed => {
                        score_or_zero(raw, &format!("{}/{}", id, col.name))
                    }
                };
                scores.push(Score {
                    slot,
                    value: normalize_counts(obtained, col.maximum),
                });
            }
            ResultRow { id, scores }
        })
        .collect();

    ResultSet {
        columns: columns.into_iter().map(|c| c.name).collect(),
        rows,
    }
}

/// Read `csv_path` and produce the normalized rows for `selected`, in
/// selection order. Unknown header names are dropped without error.
#[tracing::instrument(level = "info", skip(csv_path, selected), fields(path = %csv_path.as_ref().display()))]
pub fn extract_rows<P: AsRef<Path>>(csv_path: P, selected: &[String]) -> ResultSet {
    let table = load_score_csv(csv_path);
    let result = extract_from_table(&table, selected);
    info!(
        columns = result.columns.len(),
        rows = result.rows.len(),
        "extracted normalized scores"
    );
    result
}
