//! Error types for tabcmp operations

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TabcmpError>;

#[derive(Error, Debug)]
pub enum TabcmpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("Invalid table reference '{input}': {reason}")]
    InvalidTableRef { input: String, reason: String },

    #[error("Table not found: {table}")]
    SchemaNotFound { table: String },

    #[error("Query error: {message}")]
    Query { message: String },

    #[error("{step}: {source}")]
    Step {
        step: String,
        #[source]
        source: Box<TabcmpError>,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Export error: {message}")]
    Export { message: String },

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

impl TabcmpError {
    pub fn invalid_table_ref(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTableRef {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn schema_not_found(table: impl Into<String>) -> Self {
        Self::SchemaNotFound {
            table: table.into(),
        }
    }

    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export {
            message: msg.into(),
        }
    }

    /// Attach the name of the pipeline step that produced this error
    pub fn in_step(self, step: impl Into<String>) -> Self {
        Self::Step {
            step: step.into(),
            source: Box::new(self),
        }
    }

    /// Unwrap any step context and return the underlying error
    pub fn root_cause(&self) -> &TabcmpError {
        match self {
            Self::Step { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
