//! Error types for the diff engine

use thiserror::Error;

use crate::model::ColumnType;

/// Structural problems with a schema or with rows that claim to follow it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("schema {schema} declares no primary key")]
    MissingPrimaryKey { schema: String },

    #[error("key column {column} not found in schema {schema}")]
    KeyColumnNotFound { schema: String, column: String },

    #[error("column {column} declared twice in schema {schema}")]
    DuplicateColumn { schema: String, column: String },

    #[error("row has no value for primary key {key}")]
    MissingPrimaryKeyValue { key: String },
}

/// A comparator was handed values it cannot interpret
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot compare column {column} as {column_type}: {reason}")]
pub struct ComparisonError {
    pub column: String,
    pub column_type: ColumnType,
    pub reason: String,
}

/// Any failure that aborts a diff
#[derive(Error, Debug)]
pub enum DiffError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Comparison(#[from] ComparisonError),

    /// Failure reported by a data source, passed through unchanged
    #[error(transparent)]
    Source(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, DiffError>;
