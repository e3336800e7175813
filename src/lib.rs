//! # tabcmp
//!
//! Compares two relational tables that live in the same warehouse. A run reconciles
//! their schemas, counts rows, decides PASS/FAIL from a single existence query over the
//! symmetric difference and, when the tables differ, samples and exports the rows that
//! appear on only one side.
//!
//! The comparison core talks to the warehouse only through [`warehouse::QueryExecutor`]
//! and [`warehouse::SchemaCatalog`]; [`duckdb_backend::DuckDbWarehouse`] is the bundled
//! implementation.

pub mod cli;
pub mod commands;
pub mod comparator;
pub mod config;
pub mod duckdb_backend;
pub mod error;
pub mod output;
pub mod progress;
pub mod query;
pub mod report;
pub mod schema;
pub mod sink;
pub mod table_ref;
pub mod warehouse;

pub use comparator::TableComparator;
pub use config::{ComparisonConfig, RawComparisonConfig};
pub use error::{Result, TabcmpError};
pub use report::{ComparisonReport, ComparisonStatus};
pub use table_ref::TableRef;
