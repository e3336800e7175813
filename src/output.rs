//! Output formatting utilities

use crate::error::Result;
use crate::query::QueryPlan;
use crate::report::{ComparisonReport, ComparisonStatus, DifferenceReport};
use crate::schema::SchemaComparison;
use crate::warehouse::RowMap;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt::Write;

/// Pretty printer for tabcmp output
pub struct PrettyPrinter;

impl PrettyPrinter {
    /// Print a full comparison report
    pub fn print_comparison_report(report: &ComparisonReport) {
        print!("{}", Self::render_comparison_report(report));
    }

    /// Print schema reconciliation only
    pub fn print_schema_comparison(table1: &str, table2: &str, schema: &SchemaComparison) {
        let mut out = String::new();
        let _ = writeln!(out, "🧬 Schema: {} ↔ {}", table1, table2);
        render_schema(&mut out, table1, table2, schema, "└─");
        print!("{}", out);
    }

    /// Print the queries a comparison would issue
    pub fn print_query_plan(table1: &str, table2: &str, plan: &QueryPlan) {
        print!("{}", Self::render_query_plan(table1, table2, plan));
    }

    pub fn render_comparison_report(report: &ComparisonReport) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "🔍 Comparison: {} ↔ {}", report.table1, report.table2);
        if let Some(where_clause) = &report.where_clause {
            let _ = writeln!(out, "├─ Filter: {}", where_clause);
        }
        let _ = writeln!(
            out,
            "├─ Columns: {} in table 1, {} in table 2",
            report.table1_column_count, report.table2_column_count
        );
        render_schema(&mut out, &report.table1, &report.table2, &report.schema, "├─");

        if report.status == ComparisonStatus::NoCommonColumns {
            let _ = writeln!(out, "└─ ⚠️  No common columns found; nothing to compare");
            return out;
        }

        if let Some(projection) = &report.projection {
            let _ = writeln!(out, "├─ Compared on: {}", projection);
        }

        if let Some(counts) = &report.row_counts {
            let marker = if counts.is_equal() { "✅" } else { "⚠️ " };
            let _ = writeln!(
                out,
                "├─ {} Row counts: {} vs {} (difference {})",
                marker, counts.table1, counts.table2, counts.difference
            );
        }

        match report.status {
            ComparisonStatus::Pass => {
                let _ = writeln!(out, "└─ ✅ PASS: tables are identical for the compared columns");
            }
            ComparisonStatus::Fail => {
                let _ = writeln!(out, "└─ ❌ FAIL: tables differ");
                if let Some(differences) = &report.differences {
                    render_differences(&mut out, report, differences);
                }
            }
            ComparisonStatus::NoCommonColumns => {}
        }

        out
    }

    pub fn render_query_plan(table1: &str, table2: &str, plan: &QueryPlan) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "🧭 Query plan: {} ↔ {}", table1, table2);
        let _ = writeln!(out, "├─ Projection: {}", plan.projection);
        let _ = writeln!(out, "├─ Fingerprint: {}", plan.fingerprint());

        let steps = [
            ("Row count (table 1)", &plan.row_count_table1),
            ("Row count (table 2)", &plan.row_count_table2),
            ("Difference check", &plan.difference_check),
            ("Sample only in table 1", &plan.sample_only_in_table1),
            ("Sample only in table 2", &plan.sample_only_in_table2),
            ("Export", &plan.export),
        ];

        for (i, (title, query)) in steps.iter().enumerate() {
            let is_last = i == steps.len() - 1;
            let (branch, indent) = if is_last { ("└─", "   ") } else { ("├─", "│  ") };
            let _ = writeln!(out, "{} {}", branch, title);
            for line in query.lines() {
                let _ = writeln!(out, "{}  {}", indent, line);
            }
        }

        out
    }
}

fn render_schema(
    out: &mut String,
    table1: &str,
    table2: &str,
    schema: &SchemaComparison,
    last_branch: &str,
) {
    if !schema.only_in_table1.is_empty() {
        let _ = writeln!(out, "├─ Only in {}: {}", table1, join(&schema.only_in_table1));
    }
    if !schema.only_in_table2.is_empty() {
        let _ = writeln!(out, "├─ Only in {}: {}", table2, join(&schema.only_in_table2));
    }
    if !schema.missing_specified_cols.is_empty() {
        let _ = writeln!(
            out,
            "├─ ⚠️  Requested but not in both tables: {}",
            join(&schema.missing_specified_cols)
        );
    }
    if !schema.schema_mismatches.is_empty() {
        let _ = writeln!(out, "├─ ⚠️  Type mismatches: {}", schema.schema_mismatches.len());
        for (i, mismatch) in schema.schema_mismatches.iter().enumerate() {
            let branch = if i == schema.schema_mismatches.len() - 1 { "└─" } else { "├─" };
            let _ = writeln!(
                out,
                "│  {} {}: {} vs {}",
                branch, mismatch.column, mismatch.table1_type, mismatch.table2_type
            );
        }
    }

    let _ = writeln!(
        out,
        "├─ Common columns ({}): {}",
        schema.common_columns.len(),
        join(&schema.common_columns)
    );

    if schema.schemas_identical {
        let _ = writeln!(out, "{} ✅ Schemas: identical", last_branch);
    } else {
        let _ = writeln!(out, "{} ⚠️  Schemas: differ", last_branch);
    }
}

fn render_differences(out: &mut String, report: &ComparisonReport, differences: &DifferenceReport) {
    let sides = [
        (&report.table1, &differences.only_in_table1),
        (&report.table2, &differences.only_in_table2),
    ];

    for (table, rows) in sides {
        let _ = writeln!(
            out,
            "   ├─ Only in {} (showing up to {}): {}",
            table,
            differences.sample_limit,
            rows.len()
        );
        for (i, row) in rows.iter().enumerate() {
            let branch = if i == rows.len() - 1 { "└─" } else { "├─" };
            let _ = writeln!(out, "   │  {} {}", branch, format_row(row));
        }
    }

    match &differences.export {
        Some(export) => {
            let _ = writeln!(
                out,
                "   └─ 📁 Exported {} row(s) to {}",
                export.rows, export.destination
            );
        }
        None => {
            let _ = writeln!(out, "   └─ Export skipped");
        }
    }
}

fn join(names: &BTreeSet<String>) -> String {
    names.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// Render a row as `column=value` pairs in column order
pub fn format_row(row: &RowMap) -> String {
    row.iter()
        .map(|(column, value)| format!("{}={}", column, format_value(value)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    /// Format any serializable data as JSON
    pub fn format<T: serde::Serialize + ?Sized>(data: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(data)?)
    }

    /// Format a query plan together with its fingerprint
    pub fn format_query_plan(
        schema: &SchemaComparison,
        plan: Option<&QueryPlan>,
    ) -> Result<String> {
        let json = serde_json::json!({
            "schema": schema,
            "plan": plan,
            "fingerprint": plan.map(QueryPlan::fingerprint),
        });
        Ok(serde_json::to_string_pretty(&json)?)
    }
}
