//! Collaborator seams: query execution and schema catalog

use crate::error::{Result, TabcmpError};
use crate::query::build_schema_query;
use crate::schema::{ColumnInfo, TableSchema};
use crate::table_ref::TableRef;
use indexmap::IndexMap;
use serde_json::Value;

/// A result row keyed by column name, in projection order
pub type RowMap = IndexMap<String, Value>;

/// Fully materialized result of one query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<ResultRow<'_>> {
        self.rows.get(index).map(|values| ResultRow {
            columns: &self.columns,
            values,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = ResultRow<'_>> {
        self.rows.iter().map(move |values| ResultRow {
            columns: &self.columns,
            values,
        })
    }

    /// Convert every row into a name-keyed map
    pub fn into_maps(self) -> Vec<RowMap> {
        let columns = self.columns;
        self.rows
            .into_iter()
            .map(|values| columns.iter().cloned().zip(values).collect())
            .collect()
    }
}

/// One row, addressable by position or by column name
#[derive(Debug, Clone, Copy)]
pub struct ResultRow<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> ResultRow<'a> {
    pub fn get(&self, index: usize) -> Option<&'a Value> {
        self.values.get(index)
    }

    pub fn get_named(&self, name: &str) -> Option<&'a Value> {
        let index = self.columns.iter().position(|c| c == name)?;
        self.values.get(index)
    }

    pub fn to_map(&self) -> RowMap {
        self.columns
            .iter()
            .cloned()
            .zip(self.values.iter().cloned())
            .collect()
    }
}

/// Executes query text and returns the materialized result
pub trait QueryExecutor {
    fn execute(&self, sql: &str) -> Result<QueryResult>;
}

/// Looks up table schemas.
///
/// The default implementation reads the information schema through the executor; an
/// empty result means the table does not exist.
pub trait SchemaCatalog: QueryExecutor {
    /// Information-schema query for one table. Matches names exactly unless overridden.
    fn schema_lookup_query(&self, table: &TableRef) -> String {
        build_schema_query(table)
    }

    fn table_schema(&self, table: &TableRef) -> Result<TableSchema> {
        let result = self.execute(&self.schema_lookup_query(table))?;
        if result.is_empty() {
            return Err(TabcmpError::schema_not_found(table.qualified()));
        }

        let mut columns = Vec::with_capacity(result.len());
        for row in result.iter() {
            let name = text_at(&row, 0, "column_name")?;
            let data_type = text_at(&row, 1, "data_type")?;
            columns.push(ColumnInfo::new(name, data_type));
        }

        Ok(TableSchema::new(columns))
    }
}

fn text_at(row: &ResultRow<'_>, index: usize, field: &str) -> Result<String> {
    match row.get(index) {
        Some(Value::String(s)) => Ok(s.clone()),
        other => Err(TabcmpError::query(format!(
            "expected text {} in schema row, got {:?}",
            field, other
        ))),
    }
}

/// Read a single non-negative integer from the first row
pub fn scalar_u64(result: &QueryResult, column: &str) -> Result<u64> {
    let row = result
        .row(0)
        .ok_or_else(|| TabcmpError::query(format!("query returned no rows for '{}'", column)))?;

    match row.get_named(column).or_else(|| row.get(0)) {
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| TabcmpError::query(format!("'{}' is not a non-negative integer: {}", column, n))),
        Some(Value::String(s)) => s
            .parse()
            .map_err(|_| TabcmpError::query(format!("'{}' is not an integer: {}", column, s))),
        other => Err(TabcmpError::query(format!(
            "unexpected value for '{}': {:?}",
            column, other
        ))),
    }
}

/// Read a single boolean from the first row
pub fn scalar_bool(result: &QueryResult, column: &str) -> Result<bool> {
    let row = result
        .row(0)
        .ok_or_else(|| TabcmpError::query(format!("query returned no rows for '{}'", column)))?;

    match row.get_named(column).or_else(|| row.get(0)) {
        Some(Value::Bool(b)) => Ok(*b),
        other => Err(TabcmpError::query(format!(
            "unexpected value for '{}': {:?}",
            column, other
        ))),
    }
}
