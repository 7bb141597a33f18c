//! CSV file source

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::config::SourceConfig;
use crate::model::{ColumnType, Row, Schema, Value};

use super::{DataSource, SchemaHints};

/// Source reading a table from a CSV file with a header row.
///
/// CSV carries no types: every column is a string unless a type is declared
/// for it, and values are kept as the raw text so the declared type alone
/// decides comparison.
pub struct CsvSource {
    name: String,
    path: PathBuf,
    delimiter: u8,
    hints: SchemaHints,
}

impl CsvSource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let delimiter = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
            _ => b',',
        };
        Self {
            name: name.into(),
            path,
            delimiter,
            hints: SchemaHints::default(),
        }
    }

    pub fn from_config(config: &SourceConfig) -> Self {
        let mut source = Self::new(config.name.clone(), config.path.clone());
        source.hints = SchemaHints::from_config(config);
        source
    }

    pub fn with_primary_key(mut self, columns: Vec<String>) -> Self {
        self.hints.primary_key = columns;
        self
    }

    pub fn with_column_type(mut self, column: impl Into<String>, column_type: ColumnType) -> Self {
        self.hints.column_types.insert(column.into(), column_type);
        self
    }

    fn reader(&self) -> Result<csv::Reader<BufReader<File>>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open file: {}", self.path.display()))?;
        Ok(csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_reader(BufReader::new(file)))
    }
}

impl DataSource for CsvSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_schema(&self, table: &str) -> Result<Schema> {
        let mut reader = self.reader()?;
        let headers = reader.headers().context("Failed to read CSV headers")?;
        let columns = headers
            .iter()
            .map(|name| (name.to_string(), ColumnType::String))
            .collect();
        self.hints.build_schema(table, columns)
    }

    fn get_rows(&self, schema: &Schema) -> Result<Vec<Row>> {
        let mut reader = self.reader()?;
        let headers = reader
            .headers()
            .context("Failed to read CSV headers")?
            .clone();

        let mut rows = Vec::new();
        for (line_num, result) in reader.records().enumerate() {
            // +2 for 1-indexing and header
            let record =
                result.with_context(|| format!("Failed to read CSV row {}", line_num + 2))?;

            // Short rows simply lack the trailing columns
            let values = headers.iter().zip(record.iter()).map(|(name, field)| {
                let value = match schema.column(name).map(|c| c.column_type) {
                    Some(ColumnType::Bytes) => Value::Bytes(field.as_bytes().to_vec()),
                    _ => Value::String(field.to_string()),
                };
                (name, value)
            });
            rows.push(Row::from_values(schema, values));
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_schema_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "users.csv", "id,name,blob\n1,alice,xyz\n2,bob\n");
        let source = CsvSource::new("prod", path)
            .with_primary_key(vec!["id".into()])
            .with_column_type("id", ColumnType::Int)
            .with_column_type("blob", ColumnType::Bytes);

        let schema = source.get_schema("users").unwrap();
        assert_eq!(schema.name, "users");
        assert_eq!(schema.column("id").unwrap().column_type, ColumnType::Int);
        assert_eq!(schema.column("name").unwrap().column_type, ColumnType::String);

        let rows = source.get_rows(&schema).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("id").unwrap().value, Value::from("1"));
        assert_eq!(rows[0].get("blob").unwrap().value, Value::Bytes(b"xyz".to_vec()));
        assert!(rows[1].get("blob").is_none());
        assert!(rows[1].group_by_key.contains_key("Primary:id"));
    }

    #[test]
    fn test_tab_separated() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "users.tsv", "id\tname\n1\talice\n");
        let source = CsvSource::new("tsv", path).with_primary_key(vec!["id".into()]);
        let schema = source.get_schema("users").unwrap();
        let rows = source.get_rows(&schema).unwrap();
        assert_eq!(rows[0].get("name").unwrap().string(), "alice");
    }

    #[test]
    fn test_missing_file() {
        let source = CsvSource::new("missing", "/nonexistent/users.csv");
        let err = source.get_schema("users").unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to open file"));
    }
}
