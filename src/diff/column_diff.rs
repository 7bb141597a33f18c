//! Column (schema) comparison

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::model::{Column, Schema};

/// Columns that exist on only one side or differ between sides
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnDiff {
    /// Left-side definitions that have no equal counterpart on the right
    pub left: Vec<Column>,
    /// Right-side definitions that have no equal counterpart on the left
    pub right: Vec<Column>,
}

impl ColumnDiff {
    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }

    /// Names whose definitions changed, i.e. present in both lists
    pub fn modified_names(&self) -> impl Iterator<Item = &str> {
        self.left
            .iter()
            .filter(|l| self.right.iter().any(|r| r.name == l.name))
            .map(|c| c.name.as_str())
    }
}

/// Symmetric set difference over column definitions
pub struct ColumnDiffer<'a> {
    ignore_columns: &'a FxHashSet<String>,
}

impl<'a> ColumnDiffer<'a> {
    pub fn new(ignore_columns: &'a FxHashSet<String>) -> Self {
        Self { ignore_columns }
    }

    /// Compare two schemas. Swapping the arguments swaps the output lists.
    pub fn diff(&self, left: &Schema, right: &Schema) -> ColumnDiff {
        let left_columns = self.by_name(left);
        let right_columns = self.by_name(right);

        ColumnDiff {
            left: Self::scan(&left_columns, &right_columns),
            right: Self::scan(&right_columns, &left_columns),
        }
    }

    fn by_name<'s>(&self, schema: &'s Schema) -> IndexMap<&'s str, &'s Column> {
        schema
            .columns
            .iter()
            .filter(|c| !self.ignore_columns.contains(&c.name))
            .map(|c| (c.name.as_str(), c))
            .collect()
    }

    /// Columns of `this` that are missing from or defined differently in `other`
    fn scan(this: &IndexMap<&str, &Column>, other: &IndexMap<&str, &Column>) -> Vec<Column> {
        this.iter()
            .filter(|(name, column)| match other.get(*name) {
                Some(counterpart) => column.differs_from(counterpart),
                None => true,
            })
            .map(|(_, column)| (*column).clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnType, Key};

    fn schema(columns: Vec<Column>) -> Schema {
        Schema::new("t", columns, Some(Key::primary(["id"]))).unwrap()
    }

    fn names(columns: &[Column]) -> FxHashSet<&str> {
        columns.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_identical_schemas() {
        let s = schema(vec![
            Column::new("id", 1, ColumnType::Int),
            Column::new("name", 2, ColumnType::String),
        ]);
        let ignore = FxHashSet::default();
        assert!(ColumnDiffer::new(&ignore).diff(&s, &s).is_empty());
    }

    #[test]
    fn test_added_removed_and_modified() {
        let left = schema(vec![
            Column::new("id", 1, ColumnType::Int),
            Column::new("legacy", 2, ColumnType::String),
            Column::new("score", 3, ColumnType::Float),
        ]);
        let right = schema(vec![
            Column::new("id", 1, ColumnType::Int).with_auto_increment(true),
            Column::new("score", 2, ColumnType::Float),
            Column::new("email", 3, ColumnType::String).with_not_null(true),
        ]);
        let ignore = FxHashSet::default();
        let diff = ColumnDiffer::new(&ignore).diff(&left, &right);

        assert_eq!(names(&diff.left), ["id", "legacy"].into_iter().collect::<FxHashSet<_>>());
        assert_eq!(names(&diff.right), ["id", "email"].into_iter().collect::<FxHashSet<_>>());
        assert_eq!(diff.modified_names().collect::<Vec<_>>(), vec!["id"]);
    }

    #[test]
    fn test_ordinal_position_is_not_compared() {
        let left = schema(vec![
            Column::new("id", 1, ColumnType::Int),
            Column::new("name", 2, ColumnType::String),
        ]);
        let right = schema(vec![
            Column::new("name", 1, ColumnType::String),
            Column::new("id", 2, ColumnType::Int),
        ]);
        let ignore = FxHashSet::default();
        assert!(ColumnDiffer::new(&ignore).diff(&left, &right).is_empty());
    }

    #[test]
    fn test_ignored_columns_never_reported() {
        let left = schema(vec![
            Column::new("id", 1, ColumnType::Int),
            Column::new("updated_at", 2, ColumnType::Datetime),
        ]);
        let right = schema(vec![
            Column::new("id", 1, ColumnType::Int),
            Column::new("updated_at", 2, ColumnType::String),
            Column::new("synced_at", 3, ColumnType::Datetime),
        ]);
        let ignore: FxHashSet<String> = ["updated_at".to_string(), "synced_at".to_string()]
            .into_iter()
            .collect();
        assert!(ColumnDiffer::new(&ignore).diff(&left, &right).is_empty());
    }
}
