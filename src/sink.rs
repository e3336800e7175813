//! Destinations for the full difference export

use crate::error::{Result, TabcmpError};
use crate::warehouse::RowMap;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Receives the labeled difference rows once they are fully materialized
pub trait DifferenceSink {
    /// Human-readable destination identifier
    fn destination(&self) -> String;

    /// Write a header followed by `rows`; every row carries the keys in `columns`
    fn write_rows(&mut self, columns: &[String], rows: &[RowMap]) -> Result<()>;
}

/// Comma-separated file with a header row
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DifferenceSink for CsvSink {
    fn destination(&self) -> String {
        self.path.display().to_string()
    }

    fn write_rows(&mut self, columns: &[String], rows: &[RowMap]) -> Result<()> {
        ensure_parent_dir(&self.path)?;
        fs::write(&self.path, create_csv_content(columns, rows))?;
        log::info!("Wrote {} row(s) to {}", rows.len(), self.path.display());
        Ok(())
    }
}

/// JSON array of row objects
#[derive(Debug, Clone)]
pub struct JsonSink {
    path: PathBuf,
}

impl JsonSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DifferenceSink for JsonSink {
    fn destination(&self) -> String {
        self.path.display().to_string()
    }

    fn write_rows(&mut self, _columns: &[String], rows: &[RowMap]) -> Result<()> {
        ensure_parent_dir(&self.path)?;
        fs::write(&self.path, serde_json::to_string_pretty(rows)?)?;
        log::info!("Wrote {} row(s) to {}", rows.len(), self.path.display());
        Ok(())
    }
}

/// Choose a sink by file extension: `.json` writes JSON, anything else CSV
pub fn sink_for_path(path: &Path) -> Box<dyn DifferenceSink> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        Box::new(JsonSink::new(path))
    } else {
        Box::new(CsvSink::new(path))
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            TabcmpError::export(format!(
                "Failed to create directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }
    Ok(())
}

/// Create CSV content from a header and name-keyed rows
fn create_csv_content(columns: &[String], rows: &[RowMap]) -> String {
    let mut content = String::new();

    let headers: Vec<String> = columns.iter().map(|c| escape_csv(c)).collect();
    content.push_str(&headers.join(","));
    content.push('\n');

    for row in rows {
        let values: Vec<String> = columns
            .iter()
            .map(|col| escape_csv(&cell_text(row.get(col))))
            .collect();
        content.push_str(&values.join(","));
        content.push('\n');
    }

    content
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
