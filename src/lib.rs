//! storediff - Structural and content diff for one table held in two stores
//!
//! Compares the column definitions and the rows of the same logical table
//! read from two data sources (CSV, JSON or spreadsheet files). Rows are
//! correlated by primary key and compared cell by cell with type-aware
//! comparators, so `"1"` in a CSV and `1` in a JSON document are equal when
//! the column is declared `int`.

pub mod config;
pub mod diff;
pub mod error;
pub mod model;
pub mod output;
pub mod source;

pub use config::Config;
pub use diff::{DiffResult, Differ};
pub use error::{DiffError, Result};
pub use model::{Row, Schema, Table};
pub use source::DataSource;
