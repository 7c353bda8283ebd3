//! CSV output for result tables
//!
//! Schema: `algorithm,n,run,seconds,memory_mb,cpu_percent[,density]`.
//! Seconds use 6 decimals, memory 2 and CPU 1; unavailable samples are
//! written as empty cells. A fresh run overwrites the destination; append
//! mode adds rows under an existing, identical header.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::info;

use crate::error::{HarnessError, Result};
use crate::record::{ResultTable, SampleRecord};

pub const BASE_COLUMNS: [&str; 6] = ["algorithm", "n", "run", "seconds", "memory_mb", "cpu_percent"];
pub const DENSITY_COLUMN: &str = "density";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    #[default]
    Overwrite,
    Append,
}

pub fn header(with_density: bool) -> Vec<&'static str> {
    let mut columns = BASE_COLUMNS.to_vec();
    if with_density {
        columns.push(DENSITY_COLUMN);
    }
    columns
}

pub(crate) fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(String::new, |v| format!("{:.*}", precision, v))
}

fn format_record(record: &SampleRecord, with_density: bool) -> Vec<String> {
    let mut fields = vec![
        record.algorithm.to_string(),
        record.n.to_string(),
        record.run.to_string(),
        format!("{:.6}", record.seconds),
        fmt_opt(record.memory_mb, 2),
        fmt_opt(record.cpu_percent, 1),
    ];
    if with_density {
        fields.push(record.density.map_or_else(String::new, |d| d.to_string()));
    }
    fields
}

pub(crate) fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| HarnessError::io(parent, e))?;
    }
    Ok(())
}

/// First line of `path`, or `None` if the file is missing or empty
fn existing_header(path: &Path) -> Result<Option<String>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(HarnessError::io(path, e)),
    };
    let mut line = String::new();
    BufReader::new(file)
        .read_line(&mut line)
        .map_err(|e| HarnessError::io(path, e))?;
    let line = line.trim_end_matches(['\r', '\n']);
    Ok(if line.is_empty() { None } else { Some(line.to_string()) })
}

/// Write `table` to `path`, creating parent directories as needed
pub fn write(table: &ResultTable, path: &Path, mode: WriteMode) -> Result<()> {
    create_parent(path)?;
    let with_density = table.has_density();
    let columns = header(with_density);

    let write_header = match mode {
        WriteMode::Overwrite => true,
        WriteMode::Append => match existing_header(path)? {
            None => true,
            Some(found) => {
                let expected = columns.join(",");
                if found != expected {
                    return Err(HarnessError::SchemaMismatch {
                        path: path.to_path_buf(),
                        expected,
                        found,
                    });
                }
                false
            }
        },
    };

    let file = match mode {
        WriteMode::Overwrite => File::create(path),
        WriteMode::Append => OpenOptions::new().create(true).append(true).open(path),
    }
    .map_err(|e| HarnessError::io(path, e))?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    if write_header {
        writer
            .write_record(&columns)
            .map_err(|e| HarnessError::csv(path, e))?;
    }
    for record in table {
        writer
            .write_record(format_record(record, with_density))
            .map_err(|e| HarnessError::csv(path, e))?;
    }
    writer.flush().map_err(|e| HarnessError::io(path, e))?;

    info!(path = %path.display(), rows = table.len(), ?mode, "results written");
    Ok(())
}
