//! Rows and tables

use indexmap::IndexMap;

use super::schema::{Key, Schema};
use super::value::{GenericColumnValue, Value};

/// One data record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    /// Key canonical string (see [`Key::canonical`]) to the values forming
    /// that key, in key column order
    pub group_by_key: IndexMap<String, Vec<GenericColumnValue>>,
    /// Column name to value
    pub values: IndexMap<String, GenericColumnValue>,
}

impl Row {
    /// Build a row for `schema` from named native values.
    ///
    /// Values for names the schema does not declare are dropped. The primary
    /// key grouping is recorded only when every key column has a value, so a
    /// row missing part of its key fails correlation instead of matching on a
    /// partial key.
    pub fn from_values<I, S, V>(schema: &Schema, values: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: AsRef<str>,
        V: Into<Value>,
    {
        let mut row = Row::default();
        for (name, value) in values {
            let name = name.as_ref();
            match schema.column(name) {
                Some(column) => {
                    row.values.insert(
                        name.to_string(),
                        GenericColumnValue::new(column.clone(), value.into()),
                    );
                }
                None => {
                    tracing::debug!(schema = %schema.name, column = name, "dropping undeclared column");
                }
            }
        }
        if let Some(ref key) = schema.primary_key {
            row.group_by(key);
        }
        row
    }

    /// Record the grouping for `key` if every key column has a value
    pub fn group_by(&mut self, key: &Key) -> bool {
        let parts: Option<Vec<GenericColumnValue>> = key
            .column_names
            .iter()
            .map(|name| self.values.get(name).cloned())
            .collect();
        match parts {
            Some(parts) => {
                self.group_by_key.insert(key.canonical(), parts);
                true
            }
            None => false,
        }
    }

    /// Get a value by column name
    pub fn get(&self, column: &str) -> Option<&GenericColumnValue> {
        self.values.get(column)
    }

    /// Number of values in the row
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A schema together with the rows read for it
#[derive(Debug, Clone)]
pub struct Table {
    pub schema: Schema,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(schema: Schema, rows: Vec<Row>) -> Self {
        Self { schema, rows }
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
