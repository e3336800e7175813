//! Data shapes that stress set-difference semantics

use crate::common::{config_for, raw_config, warehouse_with, TestFixture};
use serde_json::{json, Value};
use tabcmp::sink::CsvSink;
use tabcmp::{ComparisonStatus, RawComparisonConfig, TableComparator};

#[test]
fn test_duplicate_rows_do_not_count_as_differences() {
    let warehouse = warehouse_with(
        "CREATE TABLE dup_a (id INTEGER, v VARCHAR);
         CREATE TABLE dup_b (id INTEGER, v VARCHAR);
         INSERT INTO dup_a VALUES (1, 'x'), (1, 'x'), (2, 'y');
         INSERT INTO dup_b VALUES (1, 'x'), (2, 'y');",
    );

    let report = TableComparator::new(&warehouse)
        .run(&config_for("dup_a", "dup_b"), None)
        .unwrap();

    // Row counts differ but the distinct row sets are equal
    assert_eq!(report.row_counts.unwrap().difference, 1);
    assert_eq!(report.status, ComparisonStatus::Pass);
}

#[test]
fn test_nulls_compare_equal() {
    let warehouse = warehouse_with(
        "CREATE TABLE n_a (id INTEGER, v VARCHAR);
         CREATE TABLE n_b (id INTEGER, v VARCHAR);
         INSERT INTO n_a VALUES (1, NULL), (2, 'y');
         INSERT INTO n_b VALUES (1, NULL), (2, 'y');",
    );

    let report = TableComparator::new(&warehouse)
        .run(&config_for("n_a", "n_b"), None)
        .unwrap();
    assert!(report.passed());
}

#[test]
fn test_null_versus_value_is_a_difference() {
    let warehouse = warehouse_with(
        "CREATE TABLE n_a (id INTEGER, v VARCHAR);
         CREATE TABLE n_b (id INTEGER, v VARCHAR);
         INSERT INTO n_a VALUES (1, NULL);
         INSERT INTO n_b VALUES (1, '');",
    );

    let report = TableComparator::new(&warehouse)
        .run(&config_for("n_a", "n_b"), None)
        .unwrap();
    let differences = report.differences.unwrap();
    assert_eq!(differences.only_in_table1[0]["v"], Value::Null);
    assert_eq!(differences.only_in_table2[0]["v"], json!(""));
}

#[test]
fn test_empty_tables_pass() {
    let warehouse = warehouse_with(
        "CREATE TABLE e_a (id INTEGER);
         CREATE TABLE e_b (id INTEGER);",
    );

    let report = TableComparator::new(&warehouse)
        .run(&config_for("e_a", "e_b"), None)
        .unwrap();
    let counts = report.row_counts.unwrap();
    assert_eq!((counts.table1, counts.table2), (0, 0));
    assert!(report.passed());
}

#[test]
fn test_one_empty_side_fails() {
    let warehouse = warehouse_with(
        "CREATE TABLE e_a (id INTEGER);
         CREATE TABLE e_b (id INTEGER);
         INSERT INTO e_b VALUES (7);",
    );

    let report = TableComparator::new(&warehouse)
        .run(&config_for("e_a", "e_b"), None)
        .unwrap();
    let differences = report.differences.unwrap();
    assert!(differences.only_in_table1.is_empty());
    assert_eq!(differences.only_in_table2[0]["id"], json!(7));
}

#[test]
fn test_disjoint_schemas_stop_early() {
    let warehouse = warehouse_with(
        "CREATE TABLE x (a INTEGER);
         CREATE TABLE y (b INTEGER);",
    );

    let report = TableComparator::new(&warehouse)
        .run(&config_for("x", "y"), None)
        .unwrap();
    assert_eq!(report.status, ComparisonStatus::NoCommonColumns);
    assert!(report.row_counts.is_none());
    assert!(report.projection.is_none());
}

#[test]
fn test_requested_columns_absent_everywhere() {
    let warehouse = warehouse_with(
        "CREATE TABLE x (a INTEGER);
         CREATE TABLE y (a INTEGER);",
    );
    let config = RawComparisonConfig {
        specific_columns: Some("ghost".to_string()),
        ..raw_config("x", "y")
    }
    .build()
    .unwrap();

    let report = TableComparator::new(&warehouse).run(&config, None).unwrap();
    assert_eq!(report.status, ComparisonStatus::NoCommonColumns);
    assert!(report.schema.missing_specified_cols.contains("ghost"));
}

#[test]
fn test_temporal_and_decimal_values_render_as_text() {
    let warehouse = warehouse_with(
        "CREATE TABLE t_a (d DATE, ts TIMESTAMP, amount DECIMAL(10,2));
         CREATE TABLE t_b (d DATE, ts TIMESTAMP, amount DECIMAL(10,2));
         INSERT INTO t_a VALUES (DATE '2024-03-01', TIMESTAMP '2024-03-01 12:30:00', 10.50);",
    );

    let report = TableComparator::new(&warehouse)
        .run(&config_for("t_a", "t_b"), None)
        .unwrap();
    let row = &report.differences.unwrap().only_in_table1[0];
    assert_eq!(row["d"], json!("2024-03-01"));
    assert!(row["ts"].as_str().unwrap().starts_with("2024-03-01 12:30:00"));
    assert_eq!(row["amount"], json!("10.50"));
}

#[test]
fn test_enum_nested_and_interval_values_keep_their_content() {
    let fixture = TestFixture::new().unwrap();
    let warehouse = warehouse_with(
        "CREATE TYPE feeling AS ENUM ('happy', 'sad');
         CREATE TABLE c_a (id INTEGER, mood feeling, tags VARCHAR[], iv INTERVAL, s STRUCT(x INTEGER), m MAP(VARCHAR, INTEGER));
         CREATE TABLE c_b (id INTEGER, mood feeling, tags VARCHAR[], iv INTERVAL, s STRUCT(x INTEGER), m MAP(VARCHAR, INTEGER));
         INSERT INTO c_a VALUES (1, 'happy', ['a', 'b'], INTERVAL 3 DAY, {'x': 1}, MAP {'k': 1});
         INSERT INTO c_b VALUES (1, 'sad', ['a'], INTERVAL 1 DAY, {'x': 2}, MAP {'k': 2});",
    );
    let path = fixture.path("nested.csv");
    let mut sink = CsvSink::new(&path);

    let report = TableComparator::new(&warehouse)
        .run(&config_for("c_a", "c_b"), Some(&mut sink))
        .unwrap();
    let differences = report.differences.unwrap();

    let left = &differences.only_in_table1[0];
    assert_eq!(left["mood"], json!("happy"));
    assert_eq!(left["tags"], json!(["a", "b"]));
    assert_eq!(left["iv"], json!("3 days"));
    assert_eq!(left["s"], json!({"x": 1}));
    assert_eq!(left["m"], json!({"k": 1}));

    let right = &differences.only_in_table2[0];
    assert_eq!(right["mood"], json!("sad"));
    assert_eq!(right["tags"], json!(["a"]));
    assert_eq!(right["iv"], json!("1 day"));

    let content = fixture.read_file("nested.csv").unwrap();
    assert!(!content.contains("<unsupported>"));
    assert!(content.contains("happy"));
    assert!(content.contains("3 days"));
    assert!(content.contains(r#""[""a"",""b""]""#));
}

#[test]
fn test_quoted_literals_in_filter() {
    let warehouse = warehouse_with(
        "CREATE TABLE q_a (name VARCHAR);
         CREATE TABLE q_b (name VARCHAR);
         INSERT INTO q_a VALUES ('O''Brien'), ('Smith');
         INSERT INTO q_b VALUES ('O''Brien'), ('Smyth');",
    );
    let config = RawComparisonConfig {
        where_clause: Some("WHERE name = 'O''Brien'".to_string()),
        ..raw_config("q_a", "q_b")
    }
    .build()
    .unwrap();

    let report = TableComparator::new(&warehouse).run(&config, None).unwrap();
    assert!(report.passed());
    assert_eq!(report.where_clause.as_deref(), Some("WHERE name = 'O''Brien'"));
}
