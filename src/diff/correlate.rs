//! Primary-key row correlation

use indexmap::IndexMap;

use crate::error::SchemaError;
use crate::model::{GenericColumnValue, Row, Schema};

/// Separator between composite key components
pub const KEY_SEPARATOR: &str = "|";

/// Correlation key of a row under the schema's primary key.
///
/// Composite key components are projected to strings and sorted before
/// joining, so two rows match when their key values form the same set
/// regardless of the order the source listed the key columns in. A separator
/// inside a component is escaped, so distinct value sets never join to the
/// same string.
pub fn correlation_key(schema: &Schema, row: &Row) -> Result<String, SchemaError> {
    let primary_key = schema.require_primary_key()?;
    let key = primary_key.canonical();
    let parts = row
        .group_by_key
        .get(&key)
        .ok_or(SchemaError::MissingPrimaryKeyValue { key })?;

    if !primary_key.is_composite() {
        return Ok(parts.iter().map(|v| v.string()).collect());
    }
    let mut projected: Vec<String> = parts.iter().map(|v| escape(&v.string())).collect();
    projected.sort_unstable();
    Ok(projected.join(KEY_SEPARATOR))
}

/// Escape the separator inside one composite key component
fn escape(component: &str) -> String {
    component.replace('\\', "\\\\").replace(KEY_SEPARATOR, "\\|")
}

/// Fill every schema column the row lacks with an empty string typed to that
/// column, so the row differ never sees a missing column.
fn complete(schema: &Schema, row: &Row) -> Row {
    let mut completed = row.clone();
    for column in &schema.columns {
        if !completed.values.contains_key(&column.name) {
            completed.values.insert(
                column.name.clone(),
                GenericColumnValue::new(column.clone(), ""),
            );
        }
    }
    completed
}

/// Map each row's correlation key to the completed row.
///
/// When several rows share a key, the last one wins.
pub fn to_primary_key_map(schema: &Schema, rows: &[Row]) -> Result<IndexMap<String, Row>, SchemaError> {
    schema.require_primary_key()?;

    let mut by_key = IndexMap::with_capacity(rows.len());
    for row in rows {
        let key = correlation_key(schema, row)?;
        if by_key.insert(key.clone(), complete(schema, row)).is_some() {
            tracing::warn!(schema = %schema.name, key = %key, "duplicate primary key, keeping last row");
        }
    }
    Ok(by_key)
}
