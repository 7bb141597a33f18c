//! Column, key and schema definitions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Declared type of a column.
///
/// Every scalar type has an array counterpart. The declared type, not the
/// native representation a source happened to produce, decides how values
/// of the column are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ColumnType {
    #[default]
    Null,
    String,
    Int,
    Float,
    Datetime,
    Date,
    Bytes,
    Bool,
    NullArray,
    StringArray,
    IntArray,
    FloatArray,
    DatetimeArray,
    DateArray,
    BytesArray,
    BoolArray,
}

impl ColumnType {
    /// All types, scalars first.
    pub const ALL: [ColumnType; 16] = [
        ColumnType::Null,
        ColumnType::String,
        ColumnType::Int,
        ColumnType::Float,
        ColumnType::Datetime,
        ColumnType::Date,
        ColumnType::Bytes,
        ColumnType::Bool,
        ColumnType::NullArray,
        ColumnType::StringArray,
        ColumnType::IntArray,
        ColumnType::FloatArray,
        ColumnType::DatetimeArray,
        ColumnType::DateArray,
        ColumnType::BytesArray,
        ColumnType::BoolArray,
    ];

    pub fn is_array(self) -> bool {
        self.element_type() != self
    }

    /// Scalar type of the elements for array types, the type itself otherwise.
    pub fn element_type(self) -> ColumnType {
        match self {
            ColumnType::NullArray => ColumnType::Null,
            ColumnType::StringArray => ColumnType::String,
            ColumnType::IntArray => ColumnType::Int,
            ColumnType::FloatArray => ColumnType::Float,
            ColumnType::DatetimeArray => ColumnType::Datetime,
            ColumnType::DateArray => ColumnType::Date,
            ColumnType::BytesArray => ColumnType::Bytes,
            ColumnType::BoolArray => ColumnType::Bool,
            scalar => scalar,
        }
    }

    /// Array type whose elements are of this type. Array types map to themselves.
    pub fn array_of(self) -> ColumnType {
        match self {
            ColumnType::Null => ColumnType::NullArray,
            ColumnType::String => ColumnType::StringArray,
            ColumnType::Int => ColumnType::IntArray,
            ColumnType::Float => ColumnType::FloatArray,
            ColumnType::Datetime => ColumnType::DatetimeArray,
            ColumnType::Date => ColumnType::DateArray,
            ColumnType::Bytes => ColumnType::BytesArray,
            ColumnType::Bool => ColumnType::BoolArray,
            array => array,
        }
    }

    /// Widen the type to accommodate another type seen in the same column.
    ///
    /// Used by sources that infer types from data. Incompatible types widen
    /// to `String`, which compares by canonical projection.
    pub fn widen(self, other: ColumnType) -> ColumnType {
        if self == other {
            return self;
        }

        match (self, other) {
            (ColumnType::Null, t) | (t, ColumnType::Null) => t,
            (ColumnType::NullArray, t) | (t, ColumnType::NullArray) if t.is_array() => t,
            (ColumnType::Int, ColumnType::Float) | (ColumnType::Float, ColumnType::Int) => {
                ColumnType::Float
            }
            (ColumnType::Date, ColumnType::Datetime) | (ColumnType::Datetime, ColumnType::Date) => {
                ColumnType::Datetime
            }
            (a, b) if a.is_array() && b.is_array() => {
                a.element_type().widen(b.element_type()).array_of()
            }
            _ => ColumnType::String,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.element_type() {
            ColumnType::Null => "null",
            ColumnType::String => "string",
            ColumnType::Int => "int",
            ColumnType::Float => "float",
            ColumnType::Datetime => "datetime",
            ColumnType::Date => "date",
            ColumnType::Bytes => "bytes",
            ColumnType::Bool => "bool",
            _ => unreachable!("element_type always returns a scalar"),
        };
        if self.is_array() {
            write!(f, "{}[]", name)
        } else {
            write!(f, "{}", name)
        }
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        let (scalar, array) = match lowered.strip_suffix("[]") {
            Some(inner) => (inner, true),
            None => (lowered.as_str(), false),
        };
        let ty = match scalar {
            "null" => ColumnType::Null,
            "string" | "text" | "varchar" => ColumnType::String,
            "int" | "integer" | "bigint" => ColumnType::Int,
            "float" | "double" | "numeric" | "decimal" => ColumnType::Float,
            "datetime" | "timestamp" => ColumnType::Datetime,
            "date" => ColumnType::Date,
            "bytes" | "blob" | "bytea" => ColumnType::Bytes,
            "bool" | "boolean" => ColumnType::Bool,
            _ => return Err(format!("Unknown column type: {}", s)),
        };
        Ok(if array { ty.array_of() } else { ty })
    }
}

impl TryFrom<String> for ColumnType {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ColumnType> for String {
    fn from(ty: ColumnType) -> Self {
        ty.to_string()
    }
}

/// A single field definition within a schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name, unique within a schema
    pub name: String,
    /// 1-based position of the column in its table
    pub ordinal_position: usize,
    /// Declared type
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub not_null: bool,
    pub auto_increment: bool,
}

impl Column {
    /// Create a nullable, non-autoincrement column
    pub fn new(name: impl Into<String>, ordinal_position: usize, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            ordinal_position,
            column_type,
            not_null: false,
            auto_increment: false,
        }
    }

    pub fn with_not_null(mut self, not_null: bool) -> Self {
        self.not_null = not_null;
        self
    }

    pub fn with_auto_increment(mut self, auto_increment: bool) -> Self {
        self.auto_increment = auto_increment;
        self
    }

    /// Whether two definitions of the same column disagree on anything the
    /// column diff cares about. Ordinal position is deliberately not compared.
    pub fn differs_from(&self, other: &Column) -> bool {
        self.name != other.name
            || self.column_type != other.column_type
            || self.not_null != other.not_null
            || self.auto_increment != other.auto_increment
    }
}

/// Kind of key declared on a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    Primary,
    Unique,
    Index,
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyType::Primary => write!(f, "Primary"),
            KeyType::Unique => write!(f, "Unique"),
            KeyType::Index => write!(f, "Index"),
        }
    }
}

/// A possibly composite key over ordered column names
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    pub key_type: KeyType,
    pub column_names: Vec<String>,
}

impl Key {
    pub fn new<I, S>(key_type: KeyType, column_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key_type,
            column_names: column_names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn primary<I, S>(column_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(KeyType::Primary, column_names)
    }

    /// Canonical `Type:col1,col2` form, used as the row grouping map key
    pub fn canonical(&self) -> String {
        format!("{}:{}", self.key_type, self.column_names.join(","))
    }

    pub fn is_composite(&self) -> bool {
        self.column_names.len() > 1
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

/// Structural description of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    pub primary_key: Option<Key>,
    pub columns: Vec<Column>,
}

impl Schema {
    /// Build a schema, checking that column names are unique and that every
    /// primary key column is declared.
    pub fn new(
        name: impl Into<String>,
        columns: Vec<Column>,
        primary_key: Option<Key>,
    ) -> Result<Self, SchemaError> {
        let name = name.into();

        let mut seen = rustc_hash::FxHashSet::default();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(SchemaError::DuplicateColumn {
                    schema: name,
                    column: column.name.clone(),
                });
            }
        }

        if let Some(ref key) = primary_key {
            if let Some(missing) = key.column_names.iter().find(|c| !seen.contains(c.as_str())) {
                return Err(SchemaError::KeyColumnNotFound {
                    schema: name,
                    column: missing.clone(),
                });
            }
        }

        Ok(Self {
            name,
            primary_key,
            columns,
        })
    }

    /// Primary key, or an error naming this schema if none is declared
    pub fn require_primary_key(&self) -> Result<&Key, SchemaError> {
        self.primary_key
            .as_ref()
            .ok_or_else(|| SchemaError::MissingPrimaryKey {
                schema: self.name.clone(),
            })
    }

    /// Get column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}
