//! Spreadsheet source (xlsx, xls, ods)

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::{TimeZone, Utc};

use crate::config::SourceConfig;
use crate::model::{parse_instant, Row, Schema, Value};

use super::{infer_column_types, DataSource, SchemaHints};

/// Source reading a table from one sheet of a workbook.
///
/// The first row is the header. The sheet is the configured one, else the
/// sheet named like the requested table, else the first sheet.
pub struct SpreadsheetSource {
    name: String,
    path: PathBuf,
    sheet: Option<String>,
    hints: SchemaHints,
}

impl SpreadsheetSource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            sheet: None,
            hints: SchemaHints::default(),
        }
    }

    pub fn from_config(config: &SourceConfig) -> Self {
        Self {
            name: config.name.clone(),
            path: config.path.clone(),
            sheet: config.sheet.clone(),
            hints: SchemaHints::from_config(config),
        }
    }

    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    fn read_sheet(&self, table: &str) -> Result<Sheet> {
        let mut workbook = open_workbook_auto(&self.path)
            .with_context(|| format!("Failed to open workbook: {}", self.path.display()))?;

        let sheets = workbook.sheet_names();
        let sheet_name = match self.sheet {
            Some(ref name) => name.clone(),
            None => match sheets.iter().find(|s| s.as_str() == table) {
                Some(name) => name.clone(),
                None => match sheets.first() {
                    Some(first) => first.clone(),
                    None => bail!("No sheets found in workbook"),
                },
            },
        };

        let range: Range<Data> = workbook
            .worksheet_range(&sheet_name)
            .with_context(|| format!("Failed to read sheet: {}", sheet_name))?;
        Sheet::from_range(&range)
    }
}

impl DataSource for SpreadsheetSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_schema(&self, table: &str) -> Result<Schema> {
        let sheet = self.read_sheet(table)?;
        let types = infer_column_types(sheet.header.len(), sheet.rows.iter().map(Vec::as_slice));
        self.hints
            .build_schema(table, sheet.header.into_iter().zip(types).collect())
    }

    fn get_rows(&self, schema: &Schema) -> Result<Vec<Row>> {
        let sheet = self.read_sheet(&schema.name)?;
        Ok(sheet
            .rows
            .into_iter()
            .map(|cells| {
                let values = sheet
                    .header
                    .iter()
                    .zip(cells)
                    .filter(|(_, v)| !v.is_null());
                Row::from_values(schema, values)
            })
            .collect())
    }
}

/// Header names and converted data rows of one sheet
struct Sheet {
    header: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Sheet {
    fn from_range(range: &Range<Data>) -> Result<Self> {
        let mut rows = range.rows();
        let Some(header_row) = rows.next() else {
            bail!("Empty sheet");
        };
        let header: Vec<String> = header_row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let name = cell_to_string(cell);
                if name.is_empty() {
                    format!("Column{}", i + 1)
                } else {
                    name
                }
            })
            .collect();

        let rows = rows
            .filter(|row| row.iter().any(|cell| !matches!(cell, Data::Empty)))
            .map(|row| row.iter().take(header.len()).map(convert_cell).collect())
            .collect();

        Ok(Self { header, rows })
    }
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#{:?}", e),
    }
}

fn convert_cell(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Float(f) => {
            // Check if it's actually an integer
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                Value::Int(*f as i64)
            } else {
                Value::Float(*f)
            }
        }
        Data::Int(i) => Value::Int(*i),
        Data::Bool(b) => Value::Bool(*b),
        // Durations share the serial encoding but are not instants
        Data::DateTime(dt) if dt.is_duration() => Value::String(dt.to_string()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|naive| Value::Timestamp(Utc.from_utc_datetime(&naive)))
            .unwrap_or_else(|| Value::Float(dt.as_f64())),
        Data::DateTimeIso(s) => parse_instant(s)
            .map(Value::Timestamp)
            .unwrap_or_else(|| Value::String(s.clone())),
        Data::DurationIso(s) => Value::String(s.clone()),
        Data::Error(e) => Value::String(format!("#{:?}", e)),
    }
}
