//! Result types of a comparison run

use crate::schema::SchemaComparison;
use crate::warehouse::RowMap;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Row counts of both tables under the shared filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RowCountComparison {
    pub table1: u64,
    pub table2: u64,
    pub difference: u64,
}

impl RowCountComparison {
    pub fn new(table1: u64, table2: u64) -> Self {
        Self {
            table1,
            table2,
            difference: table1.abs_diff(table2),
        }
    }

    pub fn is_equal(&self) -> bool {
        self.difference == 0
    }
}

/// Where the full difference export went
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub destination: String,
    pub rows: usize,
}

/// Divergent rows found when the tables differ
#[derive(Debug, Clone, Serialize)]
pub struct DifferenceReport {
    pub sample_limit: usize,
    pub only_in_table1: Vec<RowMap>,
    pub only_in_table2: Vec<RowMap>,
    pub export: Option<ExportSummary>,
}

/// Terminal state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonStatus {
    /// No asymmetric row exists under the projection and filter
    Pass,
    /// At least one row exists on only one side
    Fail,
    /// The common column set is empty; no data query was issued
    NoCommonColumns,
}

impl ComparisonStatus {
    pub fn is_verdict(&self) -> bool {
        !matches!(self, Self::NoCommonColumns)
    }
}

/// Everything learned in one comparison run
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub table1: String,
    pub table2: String,
    pub where_clause: Option<String>,
    pub order_by_clause: Option<String>,
    pub table1_column_count: usize,
    pub table2_column_count: usize,
    pub schema: SchemaComparison,
    pub status: ComparisonStatus,
    pub projection: Option<String>,
    pub row_counts: Option<RowCountComparison>,
    pub differences: Option<DifferenceReport>,
    pub plan_fingerprint: Option<String>,
}

impl ComparisonReport {
    pub fn passed(&self) -> bool {
        self.status == ComparisonStatus::Pass
    }

    pub fn failed(&self) -> bool {
        self.status == ComparisonStatus::Fail
    }
}
