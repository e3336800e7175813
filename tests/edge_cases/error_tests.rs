//! Failure paths: malformed input, missing tables, bad fragments, bad setup

use crate::common::sample_data::PRODUCTS;
use crate::common::{config_for, raw_config, warehouse_with, CliTestRunner};
use tabcmp::duckdb_backend::DuckDbWarehouse;
use tabcmp::{RawComparisonConfig, TableComparator, TabcmpError};

#[test]
fn test_malformed_table_reference_fails_before_setup() {
    // The setup script is broken on purpose; it must never run
    let runner = CliTestRunner::with_setup("THIS IS NOT SQL;").unwrap();
    let err = runner.expect_failure(&[
        "compare",
        "--table1",
        "main.products_a",
        "--table2",
        "memory.main.products_b",
        "--no-export",
    ]);
    assert!(matches!(err, TabcmpError::InvalidTableRef { .. }));
}

#[test]
fn test_missing_tables_are_config_errors() {
    let runner = CliTestRunner::with_setup(PRODUCTS).unwrap();
    let err = runner.expect_failure(&["compare", "--table1", "memory.main.products_a"]);
    assert!(matches!(err, TabcmpError::Config { .. }));
    assert!(err.to_string().contains("table2"));
}

#[test]
fn test_missing_table_is_schema_not_found() {
    let warehouse = warehouse_with(PRODUCTS);
    let err = TableComparator::new(&warehouse)
        .run(&config_for("products_a", "does_not_exist"), None)
        .unwrap_err();

    assert!(matches!(err.root_cause(), TabcmpError::SchemaNotFound { table } if table == "memory.main.does_not_exist"));
    assert!(err.to_string().contains("fetch schema for memory.main.does_not_exist"));
}

#[test]
fn test_invalid_where_clause_reports_failing_step() {
    let warehouse = warehouse_with(PRODUCTS);
    let config = RawComparisonConfig {
        where_clause: Some("no_such_column = 1".to_string()),
        ..raw_config("products_a", "products_b")
    }
    .build()
    .unwrap();

    let err = TableComparator::new(&warehouse).run(&config, None).unwrap_err();
    assert!(err.to_string().starts_with("row count for memory.main.products_a"));
    match err.root_cause() {
        TabcmpError::Query { message } => assert!(message.contains("no_such_column")),
        other => panic!("expected query error, got {:?}", other),
    }
}

#[test]
fn test_invalid_format_is_rejected() {
    let runner = CliTestRunner::with_setup(PRODUCTS).unwrap();
    let err = runner.expect_failure(&[
        "schema",
        "--table1",
        "memory.main.products_a",
        "--table2",
        "memory.main.products_b",
        "--format",
        "yaml",
    ]);
    assert!(matches!(err, TabcmpError::InvalidInput { .. }));
}

#[test]
fn test_missing_init_sql_file() {
    let runner = CliTestRunner::new().unwrap();
    let missing = runner.fixture().path("missing.sql");
    let err = runner.expect_failure(&[
        "--init-sql",
        missing.to_str().unwrap(),
        "schema",
        "--table1",
        "memory.main.a",
        "--table2",
        "memory.main.b",
    ]);
    assert!(matches!(err, TabcmpError::Generic(_)));
    assert!(err.to_string().contains("Failed to read init SQL"));
}

#[test]
fn test_broken_setup_script() {
    let runner = CliTestRunner::with_setup("CREATE TABLE broken (;").unwrap();
    let err = runner.expect_failure(&[
        "schema",
        "--table1",
        "memory.main.a",
        "--table2",
        "memory.main.b",
    ]);
    assert!(err.to_string().contains("Setup script failed"));
}

#[test]
fn test_attach_missing_database_file() {
    let warehouse = DuckDbWarehouse::open_in_memory().unwrap();
    let err = warehouse
        .attach("prod", std::path::Path::new("/no/such/prod.duckdb"))
        .unwrap_err();
    assert!(matches!(err, TabcmpError::InvalidInput { .. }));
}

#[test]
fn test_bad_attach_spec() {
    let runner = CliTestRunner::new().unwrap();
    let err = runner.expect_failure(&[
        "--attach",
        "no-equals-sign",
        "schema",
        "--table1",
        "memory.main.a",
        "--table2",
        "memory.main.b",
    ]);
    assert!(matches!(err, TabcmpError::Config { .. }));
}

#[test]
fn test_invalid_config_file() {
    let runner = CliTestRunner::new().unwrap();
    let config = runner
        .fixture()
        .write_file("bad.json", r#"{"table1": 42}"#)
        .unwrap();
    let err = runner.expect_failure(&["--config", config.to_str().unwrap(), "plan"]);
    assert!(matches!(err, TabcmpError::Config { .. }));
}
