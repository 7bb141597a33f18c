//! JSON array source

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use indexmap::IndexSet;
use serde_json::Value as JsonValue;

use crate::config::SourceConfig;
use crate::model::{parse_instant, ColumnType, Row, Schema, Value};

use super::{infer_column_types, DataSource, SchemaHints};

/// Source reading a table from a JSON array of objects
pub struct JsonSource {
    name: String,
    path: PathBuf,
    hints: SchemaHints,
}

impl JsonSource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            hints: SchemaHints::default(),
        }
    }

    pub fn from_config(config: &SourceConfig) -> Self {
        Self {
            name: config.name.clone(),
            path: config.path.clone(),
            hints: SchemaHints::from_config(config),
        }
    }

    pub fn with_primary_key(mut self, columns: Vec<String>) -> Self {
        self.hints.primary_key = columns;
        self
    }

    pub fn with_column_type(mut self, column: impl Into<String>, column_type: ColumnType) -> Self {
        self.hints.column_types.insert(column.into(), column_type);
        self
    }

    /// Load the records and the union of their keys in first-seen order
    fn load(&self) -> Result<(IndexSet<String>, Vec<serde_json::Map<String, JsonValue>>)> {
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open JSON file: {}", self.path.display()))?;
        let value: JsonValue = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse JSON file: {}", self.path.display()))?;

        // Handle both arrays and single objects
        let array = match value {
            JsonValue::Array(arr) => arr,
            JsonValue::Object(_) => vec![value],
            _ => bail!("JSON must be an array or object"),
        };

        let mut column_names: IndexSet<String> = IndexSet::new();
        let mut records = Vec::with_capacity(array.len());
        for (i, item) in array.into_iter().enumerate() {
            match item {
                JsonValue::Object(obj) => {
                    column_names.extend(obj.keys().cloned());
                    records.push(obj);
                }
                other => bail!("JSON record {} is not an object: {}", i + 1, other),
            }
        }
        Ok((column_names, records))
    }
}

impl DataSource for JsonSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_schema(&self, table: &str) -> Result<Schema> {
        let (column_names, records) = self.load()?;
        let converted: Vec<Vec<Value>> = records
            .iter()
            .map(|obj| {
                column_names
                    .iter()
                    .map(|name| json_to_value(obj.get(name)))
                    .collect()
            })
            .collect();
        let types = infer_column_types(column_names.len(), converted.iter().map(Vec::as_slice));

        let columns = column_names
            .into_iter()
            .zip(types)
            .enumerate()
            .map(|(i, (name, ty))| {
                // Strings that all look like dates or timestamps get that type
                let ty = if ty == ColumnType::String {
                    refine_string_type(converted.iter().map(|row| &row[i]))
                } else {
                    ty
                };
                (name, ty)
            })
            .collect();
        self.hints.build_schema(table, columns)
    }

    fn get_rows(&self, schema: &Schema) -> Result<Vec<Row>> {
        let (_, records) = self.load()?;
        Ok(records
            .iter()
            .map(|obj| {
                Row::from_values(
                    schema,
                    obj.iter()
                        .filter(|(_, v)| !v.is_null())
                        .map(|(k, v)| (k, json_to_value(Some(v)))),
                )
            })
            .collect())
    }
}

/// `Date` or `Datetime` when every non-null string parses as one
fn refine_string_type<'a>(values: impl Iterator<Item = &'a Value>) -> ColumnType {
    let mut refined = ColumnType::Null;
    for value in values {
        let ty = match value {
            Value::Null => continue,
            Value::String(s) if chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() => {
                ColumnType::Date
            }
            Value::String(s) if parse_instant(s).is_some() && s.contains(':') => {
                ColumnType::Datetime
            }
            _ => return ColumnType::String,
        };
        refined = refined.widen(ty);
    }
    match refined {
        ColumnType::Null => ColumnType::String,
        other => other,
    }
}

fn json_to_value(value: Option<&JsonValue>) -> Value {
    match value {
        None | Some(JsonValue::Null) => Value::Null,
        Some(JsonValue::Bool(b)) => Value::Bool(*b),
        Some(JsonValue::Number(n)) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::String(n.to_string())
            }
        }
        Some(JsonValue::String(s)) => Value::String(s.clone()),
        Some(JsonValue::Array(arr)) => {
            Value::Array(arr.iter().map(|v| json_to_value(Some(v))).collect())
        }
        // Nested objects have no column type; keep their JSON text
        Some(JsonValue::Object(obj)) => Value::String(JsonValue::Object(obj.clone()).to_string()),
    }
}
