//! Embedded DuckDB warehouse
//!
//! DuckDB addresses relations as `catalog.schema.table`, which maps one-to-one onto
//! `project.dataset.table`. Extra database files become additional catalogs via `ATTACH`.

use crate::error::{Result, TabcmpError};
use crate::query::build_case_insensitive_schema_query;
use crate::table_ref::TableRef;
use crate::warehouse::{QueryExecutor, QueryResult, SchemaCatalog};
use chrono::{DateTime, NaiveDate, NaiveTime};
use duckdb::types::{TimeUnit, Value as DuckValue, ValueRef};
use duckdb::Connection;
use serde_json::{Map, Value};
use std::path::Path;

/// Days between 0001-01-01 and 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Query executor and schema catalog backed by a DuckDB connection
pub struct DuckDbWarehouse {
    connection: Connection,
}

impl DuckDbWarehouse {
    /// Open an in-memory database (catalog name `memory`)
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Open a database file, or an in-memory database when no path is given
    pub fn open(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                log::info!("Opening DuckDB database: {}", path.display());
                Self::from_connection(Connection::open(path)?)
            }
            None => Self::open_in_memory(),
        }
    }

    fn from_connection(connection: Connection) -> Result<Self> {
        connection.execute_batch("SET enable_progress_bar=false")?;
        Ok(Self { connection })
    }

    /// Attach another database file read-only under `alias`
    pub fn attach(&self, alias: &str, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(TabcmpError::invalid_input(format!(
                "Database file not found for '{}': {}",
                alias,
                path.display()
            )));
        }

        let sql = format!(
            "ATTACH '{}' AS {} (READ_ONLY)",
            path.to_string_lossy().replace('\'', "''"),
            alias
        );
        log::info!("Attaching {} as '{}'", path.display(), alias);
        self.connection.execute_batch(&sql)?;
        Ok(())
    }

    /// Run a setup script (table creation, file loading, views)
    pub fn run_script(&self, sql: &str) -> Result<()> {
        log::debug!("Running setup script ({} bytes)", sql.len());
        self.connection
            .execute_batch(sql)
            .map_err(|e| TabcmpError::query(format!("Setup script failed: {}", e)))
    }

    /// Convert DuckDB errors to TabcmpError with the failing query attached
    fn convert_duckdb_error(&self, error: duckdb::Error, sql: &str) -> TabcmpError {
        let error_msg = error.to_string();

        if error_msg.contains("Catalog Error")
            || error_msg.contains("Parser Error")
            || error_msg.contains("Binder Error")
        {
            TabcmpError::query(format!("{}\nQuery:\n{}", error_msg, sql))
        } else {
            TabcmpError::DuckDb(error)
        }
    }
}

impl QueryExecutor for DuckDbWarehouse {
    fn execute(&self, sql: &str) -> Result<QueryResult> {
        log::debug!("Executing query:\n{}", sql);

        let mut stmt = self
            .connection
            .prepare(sql)
            .map_err(|e| self.convert_duckdb_error(e, sql))?;
        let mut rows = stmt
            .query([])
            .map_err(|e| self.convert_duckdb_error(e, sql))?;

        let columns: Vec<String> = rows
            .as_ref()
            .map(|s| s.column_names())
            .unwrap_or_default();

        let mut data = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                values.push(to_json_value(row.get_ref(i)?));
            }
            data.push(values);
        }

        log::debug!("Query returned {} row(s)", data.len());
        Ok(QueryResult::new(columns, data))
    }
}

// DuckDB resolves catalog, schema and table names case-insensitively
impl SchemaCatalog for DuckDbWarehouse {
    fn schema_lookup_query(&self, table: &TableRef) -> String {
        build_case_insensitive_schema_query(table)
    }
}

fn to_json_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Boolean(b) => Value::Bool(b),
        ValueRef::TinyInt(i) => Value::from(i),
        ValueRef::SmallInt(i) => Value::from(i),
        ValueRef::Int(i) => Value::from(i),
        ValueRef::BigInt(i) => Value::from(i),
        ValueRef::HugeInt(i) => match i64::try_from(i) {
            Ok(small) => Value::from(small),
            Err(_) => Value::String(i.to_string()),
        },
        ValueRef::UTinyInt(i) => Value::from(i),
        ValueRef::USmallInt(i) => Value::from(i),
        ValueRef::UInt(i) => Value::from(i),
        ValueRef::UBigInt(i) => Value::from(i),
        ValueRef::Float(f) => float_value(f as f64),
        ValueRef::Double(f) => float_value(f),
        ValueRef::Decimal(d) => Value::String(d.to_string()),
        ValueRef::Text(s) => Value::String(String::from_utf8_lossy(s).into_owned()),
        ValueRef::Blob(b) => Value::String(format!("<blob:{} bytes>", b.len())),
        ValueRef::Date32(days) => date_value(days),
        ValueRef::Time64(unit, t) => time_value(to_micros(unit, t)),
        ValueRef::Timestamp(unit, t) => timestamp_value(to_micros(unit, t)),
        ValueRef::Interval { months, days, nanos } => interval_value(months, days, nanos),
        other => owned_to_json(other.to_owned()),
    }
}

/// Nested and dictionary values (LIST, ARRAY, STRUCT, MAP, UNION, ENUM)
fn owned_to_json(value: DuckValue) -> Value {
    match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(b) => Value::Bool(b),
        DuckValue::TinyInt(i) => Value::from(i),
        DuckValue::SmallInt(i) => Value::from(i),
        DuckValue::Int(i) => Value::from(i),
        DuckValue::BigInt(i) => Value::from(i),
        DuckValue::HugeInt(i) => match i64::try_from(i) {
            Ok(small) => Value::from(small),
            Err(_) => Value::String(i.to_string()),
        },
        DuckValue::UTinyInt(i) => Value::from(i),
        DuckValue::USmallInt(i) => Value::from(i),
        DuckValue::UInt(i) => Value::from(i),
        DuckValue::UBigInt(i) => Value::from(i),
        DuckValue::Float(f) => float_value(f as f64),
        DuckValue::Double(f) => float_value(f),
        DuckValue::Decimal(d) => Value::String(d.to_string()),
        DuckValue::Text(s) | DuckValue::Enum(s) => Value::String(s),
        DuckValue::Blob(b) => Value::String(format!("<blob:{} bytes>", b.len())),
        DuckValue::Date32(days) => date_value(days),
        DuckValue::Time64(unit, t) => time_value(to_micros(unit, t)),
        DuckValue::Timestamp(unit, t) => timestamp_value(to_micros(unit, t)),
        DuckValue::Interval { months, days, nanos } => interval_value(months, days, nanos),
        DuckValue::List(items) | DuckValue::Array(items) => {
            Value::Array(items.into_iter().map(owned_to_json).collect())
        }
        DuckValue::Struct(fields) => Value::Object(
            fields
                .iter()
                .map(|(name, field)| (name.clone(), owned_to_json(field.clone())))
                .collect::<Map<String, Value>>(),
        ),
        DuckValue::Map(entries) => Value::Object(
            entries
                .iter()
                .map(|(key, entry)| (map_key(key.clone()), owned_to_json(entry.clone())))
                .collect::<Map<String, Value>>(),
        ),
        DuckValue::Union(inner) => owned_to_json(*inner),
        other => Value::String(format!("{:?}", other)),
    }
}

fn map_key(key: DuckValue) -> String {
    match owned_to_json(key) {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Render an interval the way DuckDB prints it, e.g. `1 year 2 months 3 days 04:05:06`
fn interval_value(months: i32, days: i32, nanos: i64) -> Value {
    let mut parts = Vec::new();
    let years = months / 12;
    let months = months % 12;
    for (amount, unit) in [(years, "year"), (months, "month"), (days, "day")] {
        if amount != 0 {
            let plural = if amount.abs() == 1 { "" } else { "s" };
            parts.push(format!("{} {}{}", amount, unit, plural));
        }
    }

    let micros = nanos / 1_000;
    if micros != 0 || parts.is_empty() {
        let sign = if micros < 0 { "-" } else { "" };
        let total = micros.unsigned_abs();
        let secs = total / 1_000_000;
        let mut clock = format!(
            "{}{:02}:{:02}:{:02}",
            sign,
            secs / 3_600,
            (secs / 60) % 60,
            secs % 60
        );
        let fraction = total % 1_000_000;
        if fraction != 0 {
            clock.push_str(&format!(".{:06}", fraction));
        }
        parts.push(clock);
    }

    Value::String(parts.join(" "))
}

fn float_value(f: f64) -> Value {
    serde_json::Number::from_f64(f)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(f.to_string()))
}

fn to_micros(unit: TimeUnit, value: i64) -> i64 {
    match unit {
        TimeUnit::Second => value.saturating_mul(1_000_000),
        TimeUnit::Millisecond => value.saturating_mul(1_000),
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    }
}

fn date_value(days: i32) -> Value {
    days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
        .unwrap_or_else(|| Value::from(days))
}

fn time_value(micros: i64) -> Value {
    let secs = u32::try_from(micros.div_euclid(1_000_000)).ok();
    let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
    secs.and_then(|s| NaiveTime::from_num_seconds_from_midnight_opt(s, nanos))
        .map(|t| Value::String(t.format("%H:%M:%S%.f").to_string()))
        .unwrap_or_else(|| Value::from(micros))
}

fn timestamp_value(micros: i64) -> Value {
    DateTime::from_timestamp_micros(micros)
        .map(|ts| Value::String(ts.naive_utc().format("%Y-%m-%d %H:%M:%S%.f").to_string()))
        .unwrap_or_else(|| Value::from(micros))
}
