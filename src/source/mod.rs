//! Data sources that supply schemas and rows to the diff engine

mod csv;
mod json;
mod spreadsheet;

use anyhow::Result;
use indexmap::IndexMap;

use crate::config::{SourceConfig, SourceKind};
use crate::model::{Column, ColumnType, Key, Row, Schema};

pub use self::csv::CsvSource;
pub use self::json::JsonSource;
pub use self::spreadsheet::SpreadsheetSource;

/// A store holding one copy of the table being compared
pub trait DataSource: Send + Sync {
    /// Label used in logs and error messages
    fn name(&self) -> &str;

    /// Describe `table` as this store holds it
    fn get_schema(&self, table: &str) -> Result<Schema>;

    /// Read every row of the table `schema` describes
    fn get_rows(&self, schema: &Schema) -> Result<Vec<Row>>;
}

/// Build the source a config describes
pub fn open(config: &SourceConfig) -> Box<dyn DataSource> {
    match config.kind {
        SourceKind::Csv => Box::new(CsvSource::from_config(config)),
        SourceKind::Json => Box::new(JsonSource::from_config(config)),
        SourceKind::Spreadsheet => Box::new(SpreadsheetSource::from_config(config)),
    }
}

/// Settings every file source shares
#[derive(Debug, Clone, Default)]
pub(crate) struct SchemaHints {
    pub primary_key: Vec<String>,
    pub column_types: IndexMap<String, ColumnType>,
}

impl SchemaHints {
    pub fn from_config(config: &SourceConfig) -> Self {
        Self {
            primary_key: config.primary_key.clone(),
            column_types: config.column_types.clone(),
        }
    }

    /// Build a schema from column names and the types observed in the data,
    /// applying declared type overrides and the primary key. Key columns are
    /// marked not-null.
    pub fn build_schema(&self, table: &str, columns: Vec<(String, ColumnType)>) -> Result<Schema> {
        let columns = columns
            .into_iter()
            .enumerate()
            .map(|(i, (name, inferred))| {
                let column_type = self.column_types.get(&name).copied().unwrap_or(inferred);
                let is_key = self.primary_key.contains(&name);
                Column::new(name, i + 1, column_type).with_not_null(is_key)
            })
            .collect();
        let primary_key = if self.primary_key.is_empty() {
            None
        } else {
            Some(Key::primary(self.primary_key.iter().cloned()))
        };
        Ok(Schema::new(table, columns, primary_key)?)
    }
}

/// Widen the observed type of each column over all rows
pub(crate) fn infer_column_types<'a, I>(column_count: usize, rows: I) -> Vec<ColumnType>
where
    I: IntoIterator<Item = &'a [crate::model::Value]>,
{
    let mut inferred = vec![ColumnType::Null; column_count];
    for row in rows {
        for (slot, value) in inferred.iter_mut().zip(row) {
            *slot = slot.widen(value.natural_type());
        }
    }
    inferred
}
