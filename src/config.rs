//! Comparison configuration
//!
//! `RawComparisonConfig` is what a config file or the command line provides; every field
//! is optional. `build` validates it once and produces the immutable `ComparisonConfig`
//! the comparator runs from.

use crate::error::{Result, TabcmpError};
use crate::query::{normalize_order_by_clause, normalize_where_clause};
use crate::table_ref::TableRef;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default number of sample rows fetched per direction
pub const DEFAULT_SAMPLE_LIMIT: usize = 10;

/// Default destination of the full difference export
pub const DEFAULT_EXPORT_PATH: &str = "table_row_differences.csv";

/// Unvalidated settings from a config file and/or CLI flags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawComparisonConfig {
    pub table1: Option<String>,
    pub table2: Option<String>,
    pub where_clause: Option<String>,
    pub order_by_clause: Option<String>,
    pub specific_columns: Option<String>,
    pub sample_limit: Option<usize>,
    pub output: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub attach: Vec<String>,
    pub init_sql: Option<PathBuf>,
}

impl RawComparisonConfig {
    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        serde_json::from_str(&content).map_err(|e| {
            TabcmpError::config(format!("Invalid config file '{}': {}", path.display(), e))
        })
    }

    /// Layer `overrides` on top of `self`; set fields in `overrides` win and attachments
    /// accumulate
    pub fn overlay(self, overrides: RawComparisonConfig) -> Self {
        let mut attach = self.attach;
        attach.extend(overrides.attach);

        Self {
            table1: overrides.table1.or(self.table1),
            table2: overrides.table2.or(self.table2),
            where_clause: overrides.where_clause.or(self.where_clause),
            order_by_clause: overrides.order_by_clause.or(self.order_by_clause),
            specific_columns: overrides.specific_columns.or(self.specific_columns),
            sample_limit: overrides.sample_limit.or(self.sample_limit),
            output: overrides.output.or(self.output),
            database: overrides.database.or(self.database),
            attach,
            init_sql: overrides.init_sql.or(self.init_sql),
        }
    }

    /// Validate and normalize into a `ComparisonConfig`
    pub fn build(&self) -> Result<ComparisonConfig> {
        let table1 = require_table(self.table1.as_deref(), "table1")?;
        let table2 = require_table(self.table2.as_deref(), "table2")?;

        let sample_limit = self.sample_limit.unwrap_or(DEFAULT_SAMPLE_LIMIT);
        if sample_limit == 0 {
            return Err(TabcmpError::config("sample_limit must be greater than 0"));
        }

        // A selection naming no columns means no subset
        let specific_columns = self
            .specific_columns
            .as_deref()
            .and_then(ColumnSelection::parse);

        Ok(ComparisonConfig {
            table1,
            table2,
            where_clause: normalize_where_clause(self.where_clause.as_deref()),
            order_by_clause: normalize_order_by_clause(self.order_by_clause.as_deref()),
            specific_columns,
            sample_limit,
        })
    }

    /// Parsed `alias=path` attachments
    pub fn attachments(&self) -> Result<Vec<(String, PathBuf)>> {
        self.attach.iter().map(|spec| parse_attach(spec)).collect()
    }
}

fn require_table(value: Option<&str>, field: &str) -> Result<TableRef> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            TabcmpError::config(format!(
                "{} is required (use --{} project.dataset.table or set it in the config file)",
                field, field
            ))
        })?;
    TableRef::parse(value)
}

/// Parse an `alias=path` database attachment
pub fn parse_attach(spec: &str) -> Result<(String, PathBuf)> {
    let (alias, path) = spec.split_once('=').ok_or_else(|| {
        TabcmpError::config(format!("Invalid attachment '{}': expected alias=path", spec))
    })?;

    let alias = alias.trim();
    let path = path.trim();
    if alias.is_empty() || path.is_empty() {
        return Err(TabcmpError::config(format!(
            "Invalid attachment '{}': alias and path must both be non-empty",
            spec
        )));
    }
    if !alias.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(TabcmpError::config(format!(
            "Invalid attachment alias '{}': use letters, digits and underscores",
            alias
        )));
    }

    Ok((alias.to_string(), PathBuf::from(path)))
}

/// User-requested column subset: the text as given plus the parsed names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSelection {
    raw: String,
    names: Vec<String>,
}

impl ColumnSelection {
    /// Returns `None` when the text names no columns
    pub fn parse(raw: &str) -> Option<Self> {
        let names: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .collect();

        if names.is_empty() {
            return None;
        }

        Some(Self {
            raw: raw.trim().to_string(),
            names,
        })
    }

    /// Projection text used verbatim in queries
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Validated, immutable settings for one comparison run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonConfig {
    table1: TableRef,
    table2: TableRef,
    where_clause: Option<String>,
    order_by_clause: Option<String>,
    specific_columns: Option<ColumnSelection>,
    sample_limit: usize,
}

impl ComparisonConfig {
    pub fn table1(&self) -> &TableRef {
        &self.table1
    }

    pub fn table2(&self) -> &TableRef {
        &self.table2
    }

    /// Normalized `where ...` clause
    pub fn where_clause(&self) -> Option<&str> {
        self.where_clause.as_deref()
    }

    /// Normalized `order by ...` clause
    pub fn order_by_clause(&self) -> Option<&str> {
        self.order_by_clause.as_deref()
    }

    pub fn specific_columns(&self) -> Option<&ColumnSelection> {
        self.specific_columns.as_ref()
    }

    pub fn sample_limit(&self) -> usize {
        self.sample_limit
    }
}
