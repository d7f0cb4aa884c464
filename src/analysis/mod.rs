//! Per-student performance summaries computed from normalized scores.
//!
//! Scores are rescaled from the fixed-point [`SCALE`] onto a 10-point scale
//! before any statistic is taken.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{fs, path::Path};
use tracing::info;

use crate::normalize::SCALE;
use crate::process::{ResultRow, ResultSet};

const POINTS: f64 = 10.0;
const ALPHA: f64 = 0.3;
const BETA: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Consistency {
    pub consistency: f64,
    pub mad: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub mean: f64,
    pub skewness: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distribution {
    pub entropy: f64,
    pub range: f64,
    pub cv: Option<f64>,
    pub std: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentPerformance {
    pub id: String,
    pub scores: usize,
    pub consistency: Option<Consistency>,
    pub statistics: Option<Statistics>,
    pub distribution: Option<Distribution>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    pub generated_at: DateTime<Utc>,
    pub columns: Vec<String>,
    pub students: Vec<StudentPerformance>,
}

fn mean(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Population variance (ddof = 0).
fn variance(xs: &[f64]) -> f64 {
    let m = mean(xs);
    xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / xs.len() as f64
}

/// Linear-interpolated percentile of already sorted data, `p` in [0, 100].
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Biased sample skewness, `m3 / m2^1.5`. `None` for constant data.
fn skewness(xs: &[f64]) -> Option<f64> {
    let m = mean(xs);
    let n = xs.len() as f64;
    let m2 = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / n;
    let m3 = xs.iter().map(|x| (x - m).powi(3)).sum::<f64>() / n;
    if m2 <= f64::EPSILON * m.abs().max(1.0) {
        return None;
    }
    Some(m3 / m2.powf(1.5))
}

/// Shannon entropy in bits over the positive values taken as weights.
fn entropy(xs: &[f64]) -> f64 {
    let positive: Vec<f64> = xs.iter().copied().filter(|x| *x > 0.0).collect();
    let total: f64 = positive.iter().sum();
    if total == 0.0 {
        return 0.0;
    }
    -positive
        .iter()
        .map(|x| {
            let p = x / total;
            p * p.log2()
        })
        .sum::<f64>()
}

/// Summarise one student's normalized scores.
pub fn analyze(row: &ResultRow) -> StudentPerformance {
    let points: Vec<f64> = row
        .scores
        .iter()
        .map(|s| s.value as f64 / SCALE as f64 * POINTS)
        .collect();

    if points.is_empty() {
        return StudentPerformance {
            id: row.id.clone(),
            scores: 0,
            consistency: None,
            statistics: None,
            distribution: None,
        };
    }

    let mut sorted = points.clone();
    sorted.sort_by(f64::total_cmp);

    let m = mean(&points);
    let var = variance(&points);
    let std = var.sqrt();
    let min = sorted[0];
    let max = sorted[sorted.len() - 1];
    let mad = points.iter().map(|x| (x - m).abs()).sum::<f64>() / points.len() as f64;

    StudentPerformance {
        id: row.id.clone(),
        scores: points.len(),
        consistency: Some(Consistency {
            consistency: 1.0 / (1.0 + ALPHA * var + BETA * std),
            mad,
        }),
        statistics: Some(Statistics {
            mean: m,
            skewness: skewness(&points),
            min,
            max,
            q1: percentile(&sorted, 25.0),
            median: percentile(&sorted, 50.0),
            q3: percentile(&sorted, 75.0),
        }),
        distribution: Some(Distribution {
            entropy: entropy(&points),
            range: max - min,
            cv: (m != 0.0).then(|| std / m),
            std,
        }),
    }
}

pub fn build_report(result: &ResultSet) -> PerformanceReport {
    PerformanceReport {
        generated_at: Utc::now(),
        columns: result.columns.clone(),
        students: result.rows.iter().map(analyze).collect(),
    }
}

/// Write the report for `result` to `path` as pretty JSON.
pub fn write_report<P: AsRef<Path>>(result: &ResultSet, path: P) -> Result<PerformanceReport> {
    let path = path.as_ref();
    let report = build_report(result);
    let json = serde_json::to_string_pretty(&report).context("serializing performance report")?;
    fs::write(path, json + "\n")
        .with_context(|| format!("writing performance report {}", path.display()))?;
    info!(path = %path.display(), students = report.students.len(), "wrote performance report");
    Ok(report)
}
