//! Diff engine for comparing two copies of a table

pub mod comparator;
mod column_diff;
pub mod correlate;
mod row_diff;

use std::borrow::Cow;

use anyhow::Context;
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::error::Result;
use crate::model::{Row, Schema, Table, Value};
use crate::source::DataSource;

pub use column_diff::{ColumnDiff, ColumnDiffer};
pub use comparator::Comparator;
pub use row_diff::{RowDiff, RowDiffer};

/// Combined column and row differences
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffResult {
    pub columns: ColumnDiff,
    pub rows: RowDiff,
}

impl DiffResult {
    /// Check if either side has anything the other lacks
    pub fn has_diff(&self) -> bool {
        !self.columns.is_empty() || !self.rows.is_empty()
    }

    /// Counts for reporting. Rows are classified with `schema`'s primary key:
    /// a key found in both lists is a modified row.
    pub fn stats(&self, schema: &Schema) -> Result<DiffStats> {
        let left_keys = keys(schema, &self.rows.left)?;
        let right_keys = keys(schema, &self.rows.right)?;
        let rows_modified = left_keys.intersection(&right_keys).count();

        Ok(DiffStats {
            columns_left: self.columns.left.len(),
            columns_right: self.columns.right.len(),
            columns_modified: self.columns.modified_names().count(),
            rows_left_only: left_keys.len() - rows_modified,
            rows_right_only: right_keys.len() - rows_modified,
            rows_modified,
        })
    }
}

fn keys(schema: &Schema, rows: &[Row]) -> Result<FxHashSet<String>> {
    rows.iter()
        .map(|row| correlate::correlation_key(schema, row).map_err(Into::into))
        .collect()
}

/// Statistics about the diff
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    pub columns_left: usize,
    pub columns_right: usize,
    pub columns_modified: usize,
    pub rows_left_only: usize,
    pub rows_right_only: usize,
    pub rows_modified: usize,
}

impl DiffStats {
    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.columns_left > 0
            || self.columns_right > 0
            || self.rows_left_only > 0
            || self.rows_right_only > 0
            || self.rows_modified > 0
    }
}

/// A value that differs between the two versions of a row
#[derive(Debug, Clone, PartialEq)]
pub struct CellChange {
    pub column: String,
    pub left_value: Value,
    pub right_value: Value,
}

/// A row present on both sides with differing values
#[derive(Debug, Clone, PartialEq)]
pub struct ModifiedRow {
    pub key: String,
    pub left: Row,
    pub right: Row,
    pub changes: Vec<CellChange>,
}

/// Row differences classified by correlation key, for reporting
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowReport {
    pub left_only: Vec<(String, Row)>,
    pub right_only: Vec<(String, Row)>,
    pub modified: Vec<ModifiedRow>,
}

/// Main diff engine.
///
/// Holds only the ignore list, fixed at construction; every call allocates
/// its own working maps, so one instance can serve concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct Differ {
    ignore_columns: FxHashSet<String>,
}

impl Differ {
    /// Create a differ that compares every column
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclude a column from column and row comparison. May be repeated.
    pub fn ignore_column(mut self, name: impl Into<String>) -> Self {
        self.ignore_columns.insert(name.into());
        self
    }

    /// Exclude several columns at once
    pub fn ignore_columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_columns.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn is_ignored(&self, column: &str) -> bool {
        self.ignore_columns.contains(column)
    }

    /// Compare the column definitions of two schemas
    pub fn diff_columns(&self, left: &Schema, right: &Schema) -> ColumnDiff {
        let diff = ColumnDiffer::new(&self.ignore_columns).diff(left, right);
        tracing::debug!(
            left = diff.left.len(),
            right = diff.right.len(),
            "column diff"
        );
        diff
    }

    /// Compare two row sets, both correlated with `schema`'s primary key
    pub fn diff_rows(&self, schema: &Schema, left: &[Row], right: &[Row]) -> Result<RowDiff> {
        let diff = RowDiffer::new(&self.ignore_columns).diff(schema, left, right)?;
        tracing::debug!(
            schema = %schema.name,
            left_rows = left.len(),
            right_rows = right.len(),
            left = diff.left.len(),
            right = diff.right.len(),
            "row diff"
        );
        Ok(diff)
    }

    /// Compare two tables. Rows are correlated and typed with the left schema;
    /// right rows are grouped under the left primary key first, so the sides
    /// may list key columns in different orders.
    pub fn diff(&self, left: &Table, right: &Table) -> Result<DiffResult> {
        let right_rows = regroup(&left.schema, &right.schema, &right.rows);
        Ok(DiffResult {
            columns: self.diff_columns(&left.schema, &right.schema),
            rows: self.diff_rows(&left.schema, &left.rows, &right_rows)?,
        })
    }

    /// Classify a row diff produced with `schema`: rows whose key shows up on
    /// both sides are modified, the rest exist on one side only.
    pub fn explain(&self, schema: &Schema, rows: &RowDiff) -> Result<RowReport> {
        let differ = RowDiffer::new(&self.ignore_columns);
        let mut right_by_key = correlate::to_primary_key_map(schema, &rows.right)?;
        let mut report = RowReport::default();

        for left in &rows.left {
            let key = correlate::correlation_key(schema, left)?;
            match right_by_key.shift_remove(&key) {
                Some(right) => {
                    let changes = differ
                        .changed_columns(schema, left, &right)?
                        .into_iter()
                        .map(|column| CellChange {
                            column: column.to_string(),
                            left_value: cell(left, column),
                            right_value: cell(&right, column),
                        })
                        .collect();
                    report.modified.push(ModifiedRow {
                        key,
                        left: left.clone(),
                        right,
                        changes,
                    });
                }
                None => report.left_only.push((key, left.clone())),
            }
        }
        report.right_only.extend(right_by_key);
        Ok(report)
    }

    /// Fetch `table` from both sources and compare. Any source failure aborts
    /// the diff.
    pub fn diff_sources(
        &self,
        left: &dyn DataSource,
        right: &dyn DataSource,
        table: &str,
    ) -> Result<(Table, Table, DiffResult)> {
        let left_table = fetch(left, table)?;
        let right_table = fetch(right, table)?;
        let result = self.diff(&left_table, &right_table)?;
        Ok((left_table, right_table, result))
    }
}

/// `rows` read for `from`, grouped under `to`'s primary key when the two
/// schemas declare their keys differently
fn regroup<'r>(to: &Schema, from: &Schema, rows: &'r [Row]) -> Cow<'r, [Row]> {
    match to.primary_key {
        Some(ref key) if from.primary_key.as_ref() != Some(key) => Cow::Owned(
            rows.iter()
                .map(|row| {
                    let mut row = row.clone();
                    row.group_by(key);
                    row
                })
                .collect(),
        ),
        _ => Cow::Borrowed(rows),
    }
}

fn cell(row: &Row, column: &str) -> Value {
    row.get(column)
        .map(|v| v.value.clone())
        .unwrap_or(Value::Null)
}

fn fetch(source: &dyn DataSource, table: &str) -> Result<Table> {
    let schema = source
        .get_schema(table)
        .with_context(|| format!("Failed to read schema of {} from {}", table, source.name()))?;
    let rows = source
        .get_rows(&schema)
        .with_context(|| format!("Failed to read rows of {} from {}", table, source.name()))?;
    tracing::debug!(source = source.name(), table, rows = rows.len(), "fetched table");
    Ok(Table::new(schema, rows))
}
