//! Fully-qualified table references (`project.dataset.table`)

use crate::error::{Result, TabcmpError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A queryable relation identified by a three-part path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub project: String,
    pub dataset: String,
    pub table: String,
}

impl TableRef {
    /// Parse a `project.dataset.table` path
    pub fn parse(input: &str) -> Result<Self> {
        let parts: Vec<&str> = input.split('.').collect();
        if parts.len() != 3 {
            return Err(TabcmpError::invalid_table_ref(
                input,
                format!(
                    "table path must be in format 'project.dataset.table', got {} segment(s)",
                    parts.len()
                ),
            ));
        }

        if let Some(pos) = parts.iter().position(|p| p.trim().is_empty()) {
            let segment = ["project", "dataset", "table"][pos];
            return Err(TabcmpError::invalid_table_ref(
                input,
                format!("{} segment is empty", segment),
            ));
        }

        Ok(Self {
            project: parts[0].to_string(),
            dataset: parts[1].to_string(),
            table: parts[2].to_string(),
        })
    }

    /// Fully-qualified name as used in query text
    pub fn qualified(&self) -> String {
        format!("{}.{}.{}", self.project, self.dataset, self.table)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}

impl FromStr for TableRef {
    type Err = TabcmpError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Provenance labels tagging exported rows with the side they are exclusive to.
///
/// Labels start from the bare table name and widen to include the dataset, then the
/// project, until the two labels differ.
pub fn provenance_labels(table1: &TableRef, table2: &TableRef) -> (String, String) {
    let candidates = |t: &TableRef| {
        [
            t.table.clone(),
            format!("{}_{}", t.dataset, t.table),
            format!("{}_{}_{}", t.project, t.dataset, t.table),
        ]
    };

    let left = candidates(table1);
    let right = candidates(table2);

    for (l, r) in left.iter().zip(right.iter()) {
        if l != r {
            return (format!("exclusive_to_{}", l), format!("exclusive_to_{}", r));
        }
    }

    // Same relation on both sides
    (
        format!("exclusive_to_{}_1", left[2]),
        format!("exclusive_to_{}_2", right[2]),
    )
}
