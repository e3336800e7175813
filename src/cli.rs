//! Command-line interface for tabcmp

use crate::config::RawComparisonConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tabcmp")]
#[command(about = "Compare two warehouse tables row by row")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// JSON config file with comparison settings (CLI flags override it)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// DuckDB database file (defaults to an in-memory database)
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// Attach another database read-only, as alias=path (repeatable)
    #[arg(long, global = true)]
    pub attach: Vec<String>,

    /// SQL script executed once before comparing
    #[arg(long, global = true)]
    pub init_sql: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// The table pair and the filters applied to both sides
#[derive(Args, Debug, Clone, Default)]
pub struct TableArgs {
    /// First table, as project.dataset.table
    #[arg(long)]
    pub table1: Option<String>,

    /// Second table, as project.dataset.table
    #[arg(long)]
    pub table2: Option<String>,

    /// Filter applied to both tables; the leading WHERE is optional
    #[arg(long)]
    pub where_clause: Option<String>,

    /// Ordering for samples and export; the leading ORDER BY is optional
    #[arg(long)]
    pub order_by_clause: Option<String>,

    /// Comma-separated columns to compare instead of all common columns
    #[arg(long)]
    pub specific_columns: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compare two tables and report rows present on only one side
    Compare {
        #[command(flatten)]
        tables: TableArgs,

        /// Maximum sample rows shown per direction (must be > 0)
        #[arg(long, value_parser = validate_sample_limit)]
        sample_limit: Option<usize>,

        /// Export destination for all differences; a .json extension writes JSON
        #[arg(long)]
        output: Option<PathBuf>,

        /// Skip the full difference export
        #[arg(long)]
        no_export: bool,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,

        /// Also write the JSON report to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Fetch and reconcile the schemas of both tables
    Schema {
        #[command(flatten)]
        tables: TableArgs,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// Print the queries a comparison would run without executing them
    Plan {
        #[command(flatten)]
        tables: TableArgs,

        /// Maximum sample rows per direction (must be > 0)
        #[arg(long, value_parser = validate_sample_limit)]
        sample_limit: Option<usize>,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },
}

impl TableArgs {
    /// Settings given on the command line, to overlay on a config file
    pub fn to_raw_config(&self, sample_limit: Option<usize>) -> RawComparisonConfig {
        RawComparisonConfig {
            table1: self.table1.clone(),
            table2: self.table2.clone(),
            where_clause: self.where_clause.clone(),
            order_by_clause: self.order_by_clause.clone(),
            specific_columns: self.specific_columns.clone(),
            sample_limit,
            ..Default::default()
        }
    }
}

/// Parse output format string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pretty,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {}. Use 'pretty' or 'json'", s)),
        }
    }
}

/// Validate that the sample limit is greater than 0
fn validate_sample_limit(s: &str) -> Result<usize, String> {
    let limit: usize = s
        .parse()
        .map_err(|_| format!("Invalid sample limit: '{}'. Must be a positive integer.", s))?;

    if limit == 0 {
        return Err("Sample limit must be greater than 0".to_string());
    }

    Ok(limit)
}
