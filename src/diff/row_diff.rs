//! Row comparison over correlated rows

use indexmap::IndexMap;
use rustc_hash::FxHashSet;

use super::comparator::Comparator;
use super::correlate::to_primary_key_map;
use crate::error::Result;
use crate::model::{Row, Schema};

/// Rows that exist on only one side or differ between sides
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowDiff {
    /// Left rows with no equal counterpart on the right
    pub left: Vec<Row>,
    /// Right rows with no equal counterpart on the left
    pub right: Vec<Row>,
}

impl RowDiff {
    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }
}

/// Symmetric set difference over primary-key correlated rows
pub struct RowDiffer<'a> {
    ignore_columns: &'a FxHashSet<String>,
}

impl<'a> RowDiffer<'a> {
    pub fn new(ignore_columns: &'a FxHashSet<String>) -> Self {
        Self { ignore_columns }
    }

    /// Compare two row sets read for `schema`. Swapping the row sets swaps
    /// the output lists.
    pub fn diff(&self, schema: &Schema, left: &[Row], right: &[Row]) -> Result<RowDiff> {
        let left_rows = to_primary_key_map(schema, left)?;
        let right_rows = to_primary_key_map(schema, right)?;

        Ok(RowDiff {
            left: self.scan(schema, &left_rows, &right_rows)?,
            right: self.scan(schema, &right_rows, &left_rows)?,
        })
    }

    /// Rows of `this` whose key is missing from `other` or whose counterpart
    /// differs in any compared column
    fn scan(
        &self,
        schema: &Schema,
        this: &IndexMap<String, Row>,
        other: &IndexMap<String, Row>,
    ) -> Result<Vec<Row>> {
        let mut different = Vec::new();
        for (key, row) in this {
            let same = match other.get(key) {
                Some(counterpart) => self.rows_equal(schema, row, counterpart)?,
                None => false,
            };
            if !same {
                different.push(row.clone());
            }
        }
        Ok(different)
    }

    /// Every non-ignored schema column must compare equal. The comparator is
    /// picked from the schema's declared type so both scan directions agree.
    fn rows_equal(&self, schema: &Schema, a: &Row, b: &Row) -> Result<bool> {
        for column in &schema.columns {
            if self.ignore_columns.contains(&column.name) {
                continue;
            }
            let (Some(va), Some(vb)) = (a.get(&column.name), b.get(&column.name)) else {
                return Ok(false);
            };
            if !Comparator::for_type(column.column_type).equal(va, vb)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Names of the non-ignored schema columns whose values differ
    pub fn changed_columns<'s>(&self, schema: &'s Schema, a: &Row, b: &Row) -> Result<Vec<&'s str>> {
        let mut changed = Vec::new();
        for column in &schema.columns {
            if self.ignore_columns.contains(&column.name) {
                continue;
            }
            let equal = match (a.get(&column.name), b.get(&column.name)) {
                (Some(va), Some(vb)) => Comparator::for_type(column.column_type).equal(va, vb)?,
                _ => false,
            };
            if !equal {
                changed.push(column.name.as_str());
            }
        }
        Ok(changed)
    }
}
