//! Full difference export through CSV and JSON sinks

use crate::common::sample_data::{IDENTICAL, PRODUCTS};
use crate::common::{config_for, warehouse_with, TestFixture};
use serde_json::Value;
use tabcmp::sink::{sink_for_path, CsvSink, DifferenceSink};
use tabcmp::{TableComparator, TableRef};

#[test]
fn test_export_csv_labels_each_side() {
    let fixture = TestFixture::new().unwrap();
    let warehouse = warehouse_with(PRODUCTS);
    let path = fixture.path("exports/products.csv");
    let mut sink = CsvSink::new(&path);

    let report = TableComparator::new(&warehouse)
        .run(&config_for("products_a", "products_b"), Some(&mut sink))
        .unwrap();

    let export = report.differences.unwrap().export.unwrap();
    assert_eq!(export.rows, 2);
    assert_eq!(export.destination, path.display().to_string());

    let content = fixture.read_file("exports/products.csv").unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "id,name,price,source_table");
    assert_eq!(lines.len(), 3);
    assert!(lines.contains(&"3,Cherry,3.0,exclusive_to_products_a"));
    assert!(lines.contains(&"3,Cherri,3.0,exclusive_to_products_b"));
}

#[test]
fn test_export_json_sink_orders_rows() {
    let fixture = TestFixture::new().unwrap();
    let warehouse = warehouse_with(
        "CREATE TABLE a (id INTEGER, v VARCHAR);
         CREATE TABLE b (id INTEGER, v VARCHAR);
         INSERT INTO a VALUES (1, 'x'), (2, 'y'), (5, 'only a');
         INSERT INTO b VALUES (1, 'x'), (2, 'y'), (4, 'only b'), (3, 'only b too');",
    );
    let path = fixture.path("diff.json");
    let mut sink = sink_for_path(&path);

    let table_a = TableRef::parse("memory.main.a").unwrap();
    let table_b = TableRef::parse("memory.main.b").unwrap();
    let summary = TableComparator::new(&warehouse)
        .export_all_differences(&table_a, &table_b, "id, v", None, Some("order by id"), sink.as_mut())
        .unwrap();

    assert_eq!(summary.rows, 3);
    let parsed: Value = serde_json::from_str(&fixture.read_file("diff.json").unwrap()).unwrap();
    let rows = parsed.as_array().unwrap();
    let ids: Vec<i64> = rows.iter().map(|r| r["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, [3, 4, 5]);
    assert_eq!(rows[2]["source_table"], "exclusive_to_a");
    assert_eq!(rows[0]["source_table"], "exclusive_to_b");
}

#[test]
fn test_same_table_name_in_two_schemas_gets_distinct_labels() {
    let fixture = TestFixture::new().unwrap();
    let warehouse = warehouse_with(
        "CREATE SCHEMA staging;
         CREATE TABLE main.orders (id INTEGER);
         CREATE TABLE staging.orders (id INTEGER);
         INSERT INTO main.orders VALUES (1), (2);
         INSERT INTO staging.orders VALUES (2), (3);",
    );
    let path = fixture.path("orders.csv");
    let mut sink = CsvSink::new(&path);

    let main = TableRef::parse("memory.main.orders").unwrap();
    let staging = TableRef::parse("memory.staging.orders").unwrap();
    TableComparator::new(&warehouse)
        .export_all_differences(&main, &staging, "id", None, Some("order by id"), &mut sink)
        .unwrap();

    let content = fixture.read_file("orders.csv").unwrap();
    assert_eq!(
        content,
        "id,source_table\n1,exclusive_to_main_orders\n3,exclusive_to_staging_orders\n"
    );
}

#[test]
fn test_passing_run_never_writes_export() {
    let fixture = TestFixture::new().unwrap();
    let warehouse = warehouse_with(IDENTICAL);
    let path = fixture.path("never.csv");
    let mut sink = CsvSink::new(&path);

    let report = TableComparator::new(&warehouse)
        .run(&config_for("left_t", "right_t"), Some(&mut sink))
        .unwrap();

    assert!(report.passed());
    assert!(!path.exists());
    assert_eq!(sink.destination(), path.display().to_string());
}
