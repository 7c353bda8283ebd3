//! Per-configuration aggregation of result tables
//!
//! Reads files in the sink's schema and produces one row per
//! `(algorithm, n, density)`, the shape chart renderers consume.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::{HarnessError, Result};
use crate::sink::{create_parent, fmt_opt};

pub const SUMMARY_COLUMNS: [&str; 9] = [
    "algorithm",
    "n",
    "density",
    "runs",
    "mean_seconds",
    "min_seconds",
    "max_seconds",
    "mean_memory_mb",
    "mean_cpu_percent",
];

/// A row read back from a result file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SampleRow {
    pub algorithm: String,
    pub n: usize,
    pub run: usize,
    pub seconds: f64,
    pub memory_mb: Option<f64>,
    pub cpu_percent: Option<f64>,
    #[serde(default)]
    pub density: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub algorithm: String,
    pub n: usize,
    pub density: Option<f64>,
    pub runs: usize,
    pub mean_seconds: f64,
    pub min_seconds: f64,
    pub max_seconds: f64,
    pub mean_memory_mb: Option<f64>,
    pub mean_cpu_percent: Option<f64>,
}

pub fn read_table(path: &Path) -> Result<Vec<SampleRow>> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| HarnessError::csv(path, e))?;
    reader
        .deserialize()
        .map(|row| row.map_err(|e| HarnessError::csv(path, e)))
        .collect()
}

fn mean_available(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let (sum, count) = values
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Group rows by configuration, keeping first-appearance order
pub fn summarize(rows: &[SampleRow]) -> Vec<SummaryRow> {
    let mut groups: Vec<Vec<&SampleRow>> = Vec::new();
    let mut index: HashMap<(&str, usize, Option<u64>), usize> = HashMap::new();
    for row in rows {
        let key = (row.algorithm.as_str(), row.n, row.density.map(f64::to_bits));
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(row);
    }

    groups
        .into_iter()
        .map(|group| {
            let first = group[0];
            let seconds = group.iter().map(|r| r.seconds);
            SummaryRow {
                algorithm: first.algorithm.clone(),
                n: first.n,
                density: first.density,
                runs: group.len(),
                mean_seconds: seconds.clone().sum::<f64>() / group.len() as f64,
                min_seconds: seconds.clone().fold(f64::INFINITY, f64::min),
                max_seconds: seconds.fold(f64::NEG_INFINITY, f64::max),
                mean_memory_mb: mean_available(group.iter().map(|r| r.memory_mb)),
                mean_cpu_percent: mean_available(group.iter().map(|r| r.cpu_percent)),
            }
        })
        .collect()
}

pub fn write_summary(rows: &[SummaryRow], path: &Path) -> Result<()> {
    create_parent(path)?;
    let mut writer = csv::Writer::from_path(path).map_err(|e| HarnessError::csv(path, e))?;
    writer
        .write_record(SUMMARY_COLUMNS)
        .map_err(|e| HarnessError::csv(path, e))?;
    for row in rows {
        writer
            .write_record([
                row.algorithm.clone(),
                row.n.to_string(),
                row.density.map_or_else(String::new, |d| d.to_string()),
                row.runs.to_string(),
                format!("{:.6}", row.mean_seconds),
                format!("{:.6}", row.min_seconds),
                format!("{:.6}", row.max_seconds),
                fmt_opt(row.mean_memory_mb, 2),
                fmt_opt(row.mean_cpu_percent, 1),
            ])
            .map_err(|e| HarnessError::csv(path, e))?;
    }
    writer.flush().map_err(|e| HarnessError::io(path, e))?;
    info!(path = %path.display(), groups = rows.len(), "summary written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const DENSE: &str = "algorithm,n,run,seconds,memory_mb,cpu_percent\n\
                         dense_naive,4,1,0.100000,10.00,90.0\n\
                         dense_naive,4,2,0.300000,12.00,\n\
                         dense_naive,8,1,0.500000,,\n";
    const SPARSE: &str = "algorithm,n,run,seconds,memory_mb,cpu_percent,density\n\
                          sparse_csr,8,1,0.010000,5.00,50.0,0.1\n\
                          sparse_csr,8,1,0.030000,7.00,70.0,0.2\n\
                          sparse_csr,8,2,0.050000,9.00,90.0,0.1\n";

    fn rows_from(dir: &Path, name: &str, text: &str) -> Vec<SampleRow> {
        let path = dir.join(name);
        fs::write(&path, text).unwrap();
        read_table(&path).unwrap()
    }

    #[test]
    fn test_read_table_optional_columns() {
        let dir = tempfile::tempdir().unwrap();
        let rows = rows_from(dir.path(), "dense.csv", DENSE);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].cpu_percent, None);
        assert_eq!(rows[2].memory_mb, None);
        assert!(rows.iter().all(|r| r.density.is_none()));

        let rows = rows_from(dir.path(), "sparse.csv", SPARSE);
        assert_eq!(rows[1].density, Some(0.2));
    }

    #[test]
    fn test_summarize_groups() {
        let dir = tempfile::tempdir().unwrap();
        let mut rows = rows_from(dir.path(), "dense.csv", DENSE);
        rows.extend(rows_from(dir.path(), "sparse.csv", SPARSE));
        let summary = summarize(&rows);
        assert_eq!(summary.len(), 4);

        let first = &summary[0];
        assert_eq!((first.algorithm.as_str(), first.n, first.runs), ("dense_naive", 4, 2));
        assert!((first.mean_seconds - 0.2).abs() < 1e-12);
        assert_eq!(first.min_seconds, 0.1);
        assert_eq!(first.max_seconds, 0.3);
        assert_eq!(first.mean_memory_mb, Some(11.0));
        assert_eq!(first.mean_cpu_percent, Some(90.0));

        assert_eq!(summary[1].mean_memory_mb, None);

        let sparse = &summary[2];
        assert_eq!((sparse.density, sparse.runs), (Some(0.1), 2));
        assert!((sparse.mean_seconds - 0.03).abs() < 1e-12);
        assert_eq!(summary[3].density, Some(0.2));
    }

    #[test]
    fn test_write_summary() {
        let dir = tempfile::tempdir().unwrap();
        let rows = rows_from(dir.path(), "dense.csv", DENSE);
        let out = dir.path().join("plots/summary.csv");
        write_summary(&summarize(&rows), &out).unwrap();
        let text = fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], SUMMARY_COLUMNS.join(","));
        assert_eq!(lines[1], "dense_naive,4,,2,0.200000,0.100000,0.300000,11.00,90.0");
        assert_eq!(lines[2], "dense_naive,8,,1,0.500000,0.500000,0.500000,,");
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_table(Path::new("/nonexistent/results.csv")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/results.csv"));
    }
}
