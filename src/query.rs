//! Query composition for table comparisons
//!
//! Everything in this module is a pure string template: no identifier validation and no
//! escaping. Callers own their configuration, so inputs are interpolated as given.

use crate::error::{Result, TabcmpError};
use crate::table_ref::TableRef;

const WHERE_KEYWORD: &[&str] = &["where"];
const ORDER_BY_KEYWORD: &[&str] = &["order", "by"];

/// Ensure a filter fragment starts with `where`.
///
/// Empty or whitespace-only input yields `None`. A fragment that already starts with the
/// keyword (any case) is only trimmed.
pub fn normalize_where_clause(where_clause: Option<&str>) -> Option<String> {
    normalize_clause(where_clause, WHERE_KEYWORD)
}

/// Ensure an ordering fragment starts with `order by`
pub fn normalize_order_by_clause(order_by_clause: Option<&str>) -> Option<String> {
    normalize_clause(order_by_clause, ORDER_BY_KEYWORD)
}

fn normalize_clause(fragment: Option<&str>, keyword: &[&str]) -> Option<String> {
    let trimmed = fragment?.trim();
    if trimmed.is_empty() {
        return None;
    }

    if starts_with_keyword(trimmed, keyword) {
        Some(trimmed.to_string())
    } else {
        Some(format!("{} {}", keyword.join(" "), trimmed))
    }
}

/// Case-insensitive keyword match; words may be separated by any whitespace and the
/// keyword must end on a word boundary.
fn starts_with_keyword(text: &str, keyword: &[&str]) -> bool {
    let mut rest = text;

    for (i, word) in keyword.iter().enumerate() {
        if i > 0 {
            let stripped = rest.trim_start();
            if stripped.len() == rest.len() {
                return false;
            }
            rest = stripped;
        }

        match rest.get(..word.len()) {
            Some(head) if head.eq_ignore_ascii_case(word) => rest = &rest[word.len()..],
            _ => return false,
        }
    }

    !rest.chars().next().is_some_and(|c| c.is_alphanumeric() || c == '_')
}

/// Pick the projection list: explicit text verbatim, else the common columns sorted and
/// comma-joined, else `*`.
pub fn resolve_projection<'a, I>(columns: Option<&str>, common_columns: Option<I>) -> String
where
    I: IntoIterator<Item = &'a String>,
{
    if let Some(explicit) = columns.filter(|c| !c.trim().is_empty()) {
        return explicit.to_string();
    }

    if let Some(common) = common_columns {
        let mut sorted: Vec<&str> = common.into_iter().map(String::as_str).collect();
        sorted.sort_unstable();
        sorted.dedup();
        if !sorted.is_empty() {
            return sorted.join(", ");
        }
    }

    "*".to_string()
}

/// `SELECT COUNT(*)` over one table with the optional filter
pub fn build_row_count_query(table: &TableRef, where_clause: Option<&str>) -> String {
    let mut query = format!("SELECT COUNT(*) as count FROM {}", table.qualified());
    if let Some(where_clause) = where_clause {
        query.push(' ');
        query.push_str(where_clause);
    }
    query
}

/// Ordered column name/type pairs for one table from the information schema
pub fn build_schema_query(table: &TableRef) -> String {
    format!(
        "SELECT column_name, data_type FROM information_schema.columns \
         WHERE table_catalog = '{}' AND table_schema = '{}' AND table_name = '{}' \
         ORDER BY ordinal_position",
        table.project, table.dataset, table.table
    )
}

/// Same lookup as [`build_schema_query`] for engines that fold identifier case
pub fn build_case_insensitive_schema_query(table: &TableRef) -> String {
    format!(
        "SELECT column_name, data_type FROM information_schema.columns \
         WHERE lower(table_catalog) = lower('{}') AND lower(table_schema) = lower('{}') \
         AND lower(table_name) = lower('{}') \
         ORDER BY ordinal_position",
        table.project, table.dataset, table.table
    )
}

/// Optional augmentations of a set-difference query
#[derive(Debug, Clone, Copy, Default)]
pub struct ExceptOptions<'a> {
    /// Normalized `order by ...` clause
    pub order_by_clause: Option<&'a str>,
    /// Row cap
    pub limit: Option<usize>,
    /// Literal written into an extra `source_table` column
    pub source_label: Option<&'a str>,
}

/// Outer projection placed around the inner `EXCEPT DISTINCT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OuterProjection<'a> {
    /// Inner query returned as is
    Bare,
    /// `SELECT * FROM (...)`
    Wildcard,
    /// `SELECT *, '<label>' as source_table FROM (...)`
    Labeled(&'a str),
}

/// Decision table for wrapping a set-difference query.
///
/// The engine rejects an ordering clause or an extra projected literal directly after the
/// second branch of `EXCEPT DISTINCT`, so either one forces an outer query. A row cap
/// applies equally to a bare or wrapped query.
pub fn outer_projection(label: Option<&str>, ordered: bool, limited: bool) -> OuterProjection<'_> {
    use OuterProjection::*;

    match (label, ordered, limited) {
        (None, false, false) => Bare,
        (None, false, true) => Bare,
        (None, true, false) => Wildcard,
        (None, true, true) => Wildcard,
        (Some(l), false, false) => Labeled(l),
        (Some(l), false, true) => Labeled(l),
        (Some(l), true, false) => Labeled(l),
        (Some(l), true, true) => Labeled(l),
    }
}

fn except_distinct(
    columns: &str,
    from: &TableRef,
    subtracted: &TableRef,
    where_clause: Option<&str>,
) -> String {
    let where_part = where_clause.map(|w| format!(" {}", w)).unwrap_or_default();
    format!(
        "SELECT {columns} FROM {}{where_part}\nEXCEPT DISTINCT\nSELECT {columns} FROM {}{where_part}",
        from.qualified(),
        subtracted.qualified(),
    )
}

/// Distinct rows of `from` that are absent from `subtracted`, under one projection and filter
pub fn build_except_distinct_query(
    from: &TableRef,
    subtracted: &TableRef,
    columns: &str,
    where_clause: Option<&str>,
    options: ExceptOptions<'_>,
) -> String {
    let inner = except_distinct(columns, from, subtracted, where_clause);

    let outer = outer_projection(
        options.source_label,
        options.order_by_clause.is_some(),
        options.limit.is_some(),
    );

    let mut query = match outer {
        OuterProjection::Bare => inner,
        OuterProjection::Wildcard => format!("SELECT * FROM (\n{}\n)", inner),
        OuterProjection::Labeled(label) => {
            format!("SELECT *, '{}' as source_table FROM (\n{}\n)", label, inner)
        }
    };

    // Only reachable with an outer query, see `outer_projection`
    if let Some(order_by) = options.order_by_clause {
        query.push(' ');
        query.push_str(order_by);
    }

    if let Some(limit) = options.limit {
        query.push_str(&format!(" LIMIT {}", limit));
    }

    query
}

/// Join sub-queries with `UNION ALL`, ordering the combined result when requested
pub fn build_union_query(queries: &[String], order_by_clause: Option<&str>) -> Result<String> {
    if queries.is_empty() {
        return Err(TabcmpError::invalid_input(
            "UNION ALL requires at least one sub-query",
        ));
    }

    let union = queries
        .iter()
        .map(|q| format!("({})", q))
        .collect::<Vec<_>>()
        .join("\nUNION ALL\n");

    Ok(match order_by_clause {
        Some(order_by) => format!("SELECT * FROM (\n{}\n) {}", union, order_by),
        None => union,
    })
}

/// Single boolean `has_differences` answering whether either direction of the set
/// difference is non-empty
pub fn build_difference_check_query(
    table1: &TableRef,
    table2: &TableRef,
    columns: &str,
    where_clause: Option<&str>,
) -> String {
    format!(
        "SELECT\n  CASE\n    WHEN EXISTS (\n{}\n    ) OR EXISTS (\n{}\n    ) THEN TRUE\n    ELSE FALSE\n  END as has_differences",
        except_distinct(columns, table1, table2, where_clause),
        except_distinct(columns, table2, table1, where_clause),
    )
}

/// Short stable digest of a query text
pub fn query_fingerprint(query: &str) -> String {
    let hex = blake3::hash(query.as_bytes()).to_hex();
    hex.as_str()[..16].to_string()
}

/// Every data query a full comparison run issues, in execution order
#[derive(Debug, Clone, serde::Serialize)]
pub struct QueryPlan {
    pub projection: String,
    pub row_count_table1: String,
    pub row_count_table2: String,
    pub difference_check: String,
    pub sample_only_in_table1: String,
    pub sample_only_in_table2: String,
    pub export: String,
}

impl QueryPlan {
    pub fn build(
        table1: &TableRef,
        table2: &TableRef,
        projection: &str,
        where_clause: Option<&str>,
        order_by_clause: Option<&str>,
        sample_limit: usize,
        labels: (&str, &str),
    ) -> Result<Self> {
        let sample_options = ExceptOptions {
            order_by_clause,
            limit: Some(sample_limit),
            source_label: None,
        };

        let export_only_in_1 = build_except_distinct_query(
            table1,
            table2,
            projection,
            where_clause,
            ExceptOptions {
                source_label: Some(labels.0),
                ..Default::default()
            },
        );
        let export_only_in_2 = build_except_distinct_query(
            table2,
            table1,
            projection,
            where_clause,
            ExceptOptions {
                source_label: Some(labels.1),
                ..Default::default()
            },
        );

        Ok(Self {
            projection: projection.to_string(),
            row_count_table1: build_row_count_query(table1, where_clause),
            row_count_table2: build_row_count_query(table2, where_clause),
            difference_check: build_difference_check_query(table1, table2, projection, where_clause),
            sample_only_in_table1: build_except_distinct_query(
                table1,
                table2,
                projection,
                where_clause,
                sample_options,
            ),
            sample_only_in_table2: build_except_distinct_query(
                table2,
                table1,
                projection,
                where_clause,
                sample_options,
            ),
            export: build_union_query(&[export_only_in_1, export_only_in_2], order_by_clause)?,
        })
    }

    /// Fingerprint of the difference check, which pins projection, tables and filter
    pub fn fingerprint(&self) -> String {
        query_fingerprint(&self.difference_check)
    }
}
