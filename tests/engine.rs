//! Engine-level properties exercised through the public API

use std::collections::HashSet;

use storediff::diff::comparator;
use storediff::diff::correlate::correlation_key;
use storediff::model::{Column, ColumnType, GenericColumnValue, Key, Value};
use storediff::{Differ, Row, Schema, Table};

fn schema(name: &str, columns: &[(&str, ColumnType)], key: &[&str]) -> Schema {
    let columns = columns
        .iter()
        .enumerate()
        .map(|(i, (name, ty))| Column::new(*name, i + 1, *ty))
        .collect();
    Schema::new(name, columns, Some(Key::primary(key.iter().copied()))).unwrap()
}

fn users() -> Schema {
    schema(
        "users",
        &[("id", ColumnType::String), ("name", ColumnType::String)],
        &["id"],
    )
}

fn user(schema: &Schema, id: &str, name: &str) -> Row {
    Row::from_values(schema, [("id", id), ("name", name)])
}

fn names(columns: &[Column]) -> HashSet<String> {
    columns.iter().map(|c| c.name.clone()).collect()
}

fn keyed(schema: &Schema, rows: &[Row]) -> HashSet<(String, String)> {
    rows.iter()
        .map(|row| {
            (
                correlation_key(schema, row).unwrap(),
                row.get("name").map(|v| v.string().into_owned()).unwrap_or_default(),
            )
        })
        .collect()
}

fn value(name: &str, ty: ColumnType, value: impl Into<Value>) -> GenericColumnValue {
    GenericColumnValue::new(Column::new(name, 1, ty), value)
}

#[test]
fn test_scenario_column_type_change() {
    let left = schema(
        "users",
        &[("id", ColumnType::String), ("name", ColumnType::String)],
        &["id"],
    );
    let right = schema(
        "users",
        &[("id", ColumnType::Int), ("name", ColumnType::String)],
        &["id"],
    );

    let diff = Differ::new().diff_columns(&left, &right);
    assert_eq!(diff.left.len(), 1);
    assert_eq!(diff.left[0].name, "id");
    assert_eq!(diff.left[0].column_type, ColumnType::String);
    assert_eq!(diff.right.len(), 1);
    assert_eq!(diff.right[0].name, "id");
    assert_eq!(diff.right[0].column_type, ColumnType::Int);
}

#[test]
fn test_scenario_modified_and_added_rows() {
    let s = users();
    let left = vec![user(&s, "id0", "name0"), user(&s, "id1", "name1")];
    let right = vec![
        user(&s, "id0", "name0_modified"),
        user(&s, "id1", "name1"),
        user(&s, "id2", "name2"),
    ];

    let diff = Differ::new().diff_rows(&s, &left, &right).unwrap();
    assert_eq!(
        keyed(&s, &diff.left),
        HashSet::from([("id0".to_string(), "name0".to_string())])
    );
    assert_eq!(
        keyed(&s, &diff.right),
        HashSet::from([
            ("id0".to_string(), "name0_modified".to_string()),
            ("id2".to_string(), "name2".to_string()),
        ])
    );
}

#[test]
fn test_symmetry() {
    let a = schema(
        "t",
        &[
            ("id", ColumnType::Int),
            ("name", ColumnType::String),
            ("score", ColumnType::Float),
        ],
        &["id"],
    );
    let b = schema(
        "t",
        &[
            ("id", ColumnType::String),
            ("name", ColumnType::String),
            ("email", ColumnType::String),
        ],
        &["id"],
    );
    let differ = Differ::new();
    let ab = differ.diff_columns(&a, &b);
    let ba = differ.diff_columns(&b, &a);
    assert_eq!(names(&ab.left), names(&ba.right));
    assert_eq!(names(&ab.right), names(&ba.left));

    let s = users();
    let r1 = vec![user(&s, "1", "a"), user(&s, "2", "b"), user(&s, "3", "c")];
    let r2 = vec![user(&s, "2", "b"), user(&s, "3", "C"), user(&s, "4", "d")];
    let forward = differ.diff_rows(&s, &r1, &r2).unwrap();
    let backward = differ.diff_rows(&s, &r2, &r1).unwrap();
    assert_eq!(keyed(&s, &forward.left), keyed(&s, &backward.right));
    assert_eq!(keyed(&s, &forward.right), keyed(&s, &backward.left));
}

#[test]
fn test_idempotence() {
    let s = users();
    let rows = vec![user(&s, "1", "a"), user(&s, "2", "b")];
    let differ = Differ::new();
    assert!(differ.diff_columns(&s, &s).is_empty());
    assert!(differ.diff_rows(&s, &rows, &rows).unwrap().is_empty());
}

#[test]
fn test_ignore_list() {
    let left = schema(
        "t",
        &[("id", ColumnType::String), ("note", ColumnType::String)],
        &["id"],
    );
    let right = schema(
        "t",
        &[("id", ColumnType::String), ("note", ColumnType::Int)],
        &["id"],
    );
    let differ = Differ::new().ignore_column("note");

    let columns = differ.diff_columns(&left, &right);
    assert!(columns.is_empty());

    let l = vec![Row::from_values(&left, [("id", "1"), ("note", "x")])];
    let r = vec![Row::from_values(&left, [("id", "1"), ("note", "y")])];
    assert!(differ.diff_rows(&left, &l, &r).unwrap().is_empty());
    assert!(!Differ::new().diff_rows(&left, &l, &r).unwrap().is_empty());
}

#[test]
fn test_type_coercions() {
    let cases = [
        (
            value("c", ColumnType::Int, 12345i64),
            value("c", ColumnType::String, "12345"),
        ),
        (
            value("c", ColumnType::Float, 123.45f64),
            value("c", ColumnType::String, "123.45"),
        ),
        (
            value("c", ColumnType::Bool, true),
            value("c", ColumnType::String, "true"),
        ),
        (
            value("c", ColumnType::Bool, true),
            value("c", ColumnType::String, "1"),
        ),
        (
            value("c", ColumnType::StringArray, Value::array(["123", "456"])),
            value("c", ColumnType::IntArray, Value::array([123i64, 456])),
        ),
        (
            value("c", ColumnType::String, "123,456,-789"),
            value("c", ColumnType::IntArray, Value::array([123i64, 456, -789])),
        ),
    ];
    for (v1, v2) in &cases {
        assert!(comparator::equal(v1, v2).unwrap(), "{} should equal {}", v1, v2);
    }
}

#[test]
fn test_composite_key_ignores_column_order() {
    let left = schema(
        "orders",
        &[
            ("region", ColumnType::String),
            ("order_id", ColumnType::Int),
            ("total", ColumnType::Float),
        ],
        &["region", "order_id"],
    );
    let right = schema(
        "orders",
        &[
            ("order_id", ColumnType::Int),
            ("region", ColumnType::String),
            ("total", ColumnType::Float),
        ],
        &["order_id", "region"],
    );
    let l = Row::from_values(
        &left,
        [
            ("region", Value::from("eu")),
            ("order_id", Value::Int(7)),
            ("total", Value::Float(1.5)),
        ],
    );
    let r = Row::from_values(
        &right,
        [
            ("order_id", Value::Int(7)),
            ("region", Value::from("eu")),
            ("total", Value::Float(1.5)),
        ],
    );
    assert_eq!(
        correlation_key(&left, &l).unwrap(),
        correlation_key(&right, &r).unwrap()
    );

    let other = Row::from_values(
        &left,
        [("region", Value::from("us")), ("order_id", Value::Int(7))],
    );
    assert_ne!(
        correlation_key(&left, &l).unwrap(),
        correlation_key(&left, &other).unwrap()
    );

    // The combined diff correlates the same rows across both key orders
    let left_table = Table::new(left.clone(), vec![l]);
    let right_table = Table::new(right.clone(), vec![r]);
    let result = Differ::new().diff(&left_table, &right_table).unwrap();
    assert!(result.rows.is_empty());
    assert_eq!(names(&result.columns.left), names(&result.columns.right));
}
