//! JSON output format

use std::io::Write;

use anyhow::Result;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::diff::{CellChange, ColumnDiff, DiffStats};
use crate::model::{Row, Schema, Value};

use super::{OutputFormatter, Report};

/// JSON output formatter
pub struct JsonOutput {
    pretty: bool,
    stats_only: bool,
}

impl JsonOutput {
    pub fn new() -> Self {
        Self {
            pretty: true,
            stats_only: false,
        }
    }

    pub fn compact() -> Self {
        Self {
            pretty: false,
            ..Self::new()
        }
    }

    pub fn with_stats_only(mut self, stats_only: bool) -> Self {
        self.stats_only = stats_only;
        self
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct JsonDiffOutput<'a> {
    table: &'a str,
    left: &'a str,
    right: &'a str,
    has_diff: bool,
    column_diff: &'a ColumnDiff,
    #[serde(skip_serializing_if = "Option::is_none")]
    row_diff: Option<JsonRowDiff>,
    stats: &'a DiffStats,
}

#[derive(Serialize)]
struct JsonRowDiff {
    left_only: Vec<JsonRow>,
    right_only: Vec<JsonRow>,
    modified: Vec<JsonModifiedRow>,
}

#[derive(Serialize)]
struct JsonRow {
    key: String,
    values: IndexMap<String, JsonValue>,
}

#[derive(Serialize)]
struct JsonModifiedRow {
    key: String,
    changes: Vec<JsonCellChange>,
}

#[derive(Serialize)]
struct JsonCellChange {
    column: String,
    left_value: JsonValue,
    right_value: JsonValue,
}

fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Int(i) => serde_json::json!(*i),
        // NaN and infinities have no JSON number form
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(f.to_string())),
        Value::String(s) => JsonValue::String(s.clone()),
        Value::Bytes(_) | Value::Timestamp(_) | Value::Date(_) => {
            JsonValue::String(value.display().into_owned())
        }
        Value::Array(items) => JsonValue::Array(items.iter().map(value_to_json).collect()),
    }
}

fn row_to_json(schema: &Schema, key: &str, row: &Row) -> JsonRow {
    let values = schema
        .column_names()
        .filter_map(|name| {
            row.get(name)
                .map(|v| (name.to_string(), value_to_json(&v.value)))
        })
        .collect();
    JsonRow {
        key: key.to_string(),
        values,
    }
}

fn change_to_json(change: &CellChange) -> JsonCellChange {
    JsonCellChange {
        column: change.column.clone(),
        left_value: value_to_json(&change.left_value),
        right_value: value_to_json(&change.right_value),
    }
}

impl OutputFormatter for JsonOutput {
    fn render(&self, report: &Report<'_>, writer: &mut dyn Write) -> Result<()> {
        let row_diff = (!self.stats_only).then(|| JsonRowDiff {
            left_only: report
                .rows
                .left_only
                .iter()
                .map(|(key, row)| row_to_json(&report.left.table.schema, key, row))
                .collect(),
            right_only: report
                .rows
                .right_only
                .iter()
                .map(|(key, row)| row_to_json(&report.right.table.schema, key, row))
                .collect(),
            modified: report
                .rows
                .modified
                .iter()
                .map(|m| JsonModifiedRow {
                    key: m.key.clone(),
                    changes: m.changes.iter().map(change_to_json).collect(),
                })
                .collect(),
        });

        let output = JsonDiffOutput {
            table: report.table,
            left: report.left.name,
            right: report.right.name,
            has_diff: report.result.has_diff(),
            column_diff: &report.result.columns,
            row_diff,
            stats: &report.stats,
        };

        if self.pretty {
            serde_json::to_writer_pretty(&mut *writer, &output)?;
        } else {
            serde_json::to_writer(&mut *writer, &output)?;
        }
        writeln!(writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::Differ;
    use crate::model::{Column, ColumnType, Key, Table};
    use crate::output::Side;

    fn table(rows: &[(i64, &str)], extra: bool) -> Table {
        let mut columns = vec![
            Column::new("id", 1, ColumnType::Int),
            Column::new("name", 2, ColumnType::String),
        ];
        if extra {
            columns.push(Column::new("email", 3, ColumnType::String));
        }
        let schema = Schema::new("users", columns, Some(Key::primary(["id"]))).unwrap();
        let rows = rows
            .iter()
            .map(|(id, name)| {
                Row::from_values(&schema, [("id", Value::Int(*id)), ("name", Value::from(*name))])
            })
            .collect();
        Table::new(schema, rows)
    }

    fn render(output: JsonOutput) -> JsonValue {
        let left = table(&[(1, "a"), (2, "b")], false);
        let right = table(&[(2, "B"), (3, "c")], true);
        let differ = Differ::new();
        let result = differ.diff(&left, &right).unwrap();
        let report = Report::build(
            &differ,
            "users",
            Side { name: "prod", table: &left },
            Side { name: "stage", table: &right },
            &result,
        )
        .unwrap();
        let mut buf = Vec::new();
        output.render(&report, &mut buf).unwrap();
        serde_json::from_slice(&buf).unwrap()
    }

    #[test]
    fn test_document_shape() {
        let doc = render(JsonOutput::new());
        assert_eq!(doc["table"], "users");
        assert_eq!(doc["has_diff"], true);
        assert_eq!(doc["column_diff"]["right"][0]["name"], "email");
        assert_eq!(doc["column_diff"]["right"][0]["type"], "string");
        assert_eq!(doc["row_diff"]["left_only"][0]["key"], "1");
        assert_eq!(doc["row_diff"]["left_only"][0]["values"]["id"], 1);
        assert_eq!(doc["row_diff"]["right_only"][0]["values"]["name"], "c");
        assert_eq!(doc["row_diff"]["modified"][0]["changes"][0]["column"], "name");
        assert_eq!(doc["row_diff"]["modified"][0]["changes"][0]["left_value"], "b");
        assert_eq!(doc["row_diff"]["modified"][0]["changes"][0]["right_value"], "B");
        assert_eq!(doc["stats"]["rows_left_only"], 1);
        assert_eq!(doc["stats"]["rows_right_only"], 1);
        assert_eq!(doc["stats"]["rows_modified"], 1);
        assert_eq!(doc["stats"]["columns_right"], 1);
    }

    #[test]
    fn test_stats_only_omits_rows() {
        let doc = render(JsonOutput::compact().with_stats_only(true));
        assert!(doc.get("row_diff").is_none());
        assert_eq!(doc["stats"]["rows_modified"], 1);
    }

    #[test]
    fn test_value_to_json() {
        assert_eq!(value_to_json(&Value::Null), JsonValue::Null);
        assert_eq!(value_to_json(&Value::Float(f64::NAN)), JsonValue::String("NaN".into()));
        assert_eq!(
            value_to_json(&Value::array([1i64, 2])),
            serde_json::json!([1, 2])
        );
    }
}
