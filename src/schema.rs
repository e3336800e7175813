//! Table schemas and schema reconciliation

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Column name and declared type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// Columns of one table in physical order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub columns: Vec<ColumnInfo>,
}

impl TableSchema {
    pub fn new(columns: Vec<ColumnInfo>) -> Self {
        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_names(&self) -> BTreeSet<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn data_type(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.data_type.as_str())
    }
}

impl<N: Into<String>, T: Into<String>> FromIterator<(N, T)> for TableSchema {
    fn from_iter<I: IntoIterator<Item = (N, T)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(name, data_type)| ColumnInfo::new(name, data_type))
                .collect(),
        )
    }
}

/// A common column whose declared type differs between the two tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMismatch {
    pub column: String,
    pub table1_type: String,
    pub table2_type: String,
}

/// Reconciled view of two schemas, computed once per run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaComparison {
    pub common_columns: BTreeSet<String>,
    pub only_in_table1: BTreeSet<String>,
    pub only_in_table2: BTreeSet<String>,
    pub schema_mismatches: Vec<TypeMismatch>,
    pub missing_specified_cols: BTreeSet<String>,
    pub schemas_identical: bool,
}

impl SchemaComparison {
    /// Compare two schemas, optionally restricted to a requested column subset.
    ///
    /// Requesting a subset always clears `schemas_identical`, even when the subset covers
    /// every column and the types agree.
    pub fn analyze(
        schema1: &TableSchema,
        schema2: &TableSchema,
        specific_columns: Option<&[String]>,
    ) -> Self {
        let schema1_columns = schema1.column_names();
        let schema2_columns = schema2.column_names();

        let both: BTreeSet<String> = schema1_columns
            .intersection(&schema2_columns)
            .cloned()
            .collect();

        let (common_columns, missing_specified_cols) = match specific_columns {
            Some(requested) => {
                let requested: BTreeSet<String> = requested.iter().cloned().collect();
                let common: BTreeSet<String> = requested.intersection(&both).cloned().collect();
                let missing = requested.difference(&common).cloned().collect();
                (common, missing)
            }
            None => (both, BTreeSet::new()),
        };

        let only_in_table1 = schema1_columns.difference(&schema2_columns).cloned().collect();
        let only_in_table2 = schema2_columns.difference(&schema1_columns).cloned().collect();

        let types1: BTreeMap<&str, &str> = schema1
            .columns
            .iter()
            .map(|c| (c.name.as_str(), c.data_type.as_str()))
            .collect();
        let types2: BTreeMap<&str, &str> = schema2
            .columns
            .iter()
            .map(|c| (c.name.as_str(), c.data_type.as_str()))
            .collect();

        let schema_mismatches: Vec<TypeMismatch> = common_columns
            .iter()
            .filter_map(|col| {
                let t1 = types1.get(col.as_str())?;
                let t2 = types2.get(col.as_str())?;
                (t1 != t2).then(|| TypeMismatch {
                    column: col.clone(),
                    table1_type: t1.to_string(),
                    table2_type: t2.to_string(),
                })
            })
            .collect();

        let schemas_identical = schema1.len() == schema2.len()
            && schema_mismatches.is_empty()
            && specific_columns.is_none();

        Self {
            common_columns,
            only_in_table1,
            only_in_table2,
            schema_mismatches,
            missing_specified_cols,
            schemas_identical,
        }
    }

    /// No column can be compared; the pipeline stops before any data query
    pub fn has_no_common_columns(&self) -> bool {
        self.common_columns.is_empty()
    }

    /// Schema-level differences that are reported as warnings
    pub fn has_warnings(&self) -> bool {
        !self.only_in_table1.is_empty()
            || !self.only_in_table2.is_empty()
            || !self.schema_mismatches.is_empty()
            || !self.missing_specified_cols.is_empty()
    }
}
