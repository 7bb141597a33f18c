//! Data model shared by sources and the diff engine

mod row;
mod schema;
mod value;

pub use row::{Row, Table};
pub use schema::{Column, ColumnType, Key, KeyType, Schema};
pub use value::{parse_instant, zero_instant, GenericColumnValue, Value};
