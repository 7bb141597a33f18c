//! Type-aware value comparison

use crate::error::ComparisonError;
use crate::model::{ColumnType, GenericColumnValue, Value};

/// Equality strategy for values of one declared column type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// Compare as absolute instants
    Datetime,
    /// Compare boolean views
    Bool,
    /// Raw byte sequences only
    Bytes,
    /// Compare canonical string projections
    Projection,
    /// Native equality of the raw values
    Native,
}

impl Comparator {
    /// Strategy for a declared column type
    pub fn for_type(column_type: ColumnType) -> Comparator {
        match column_type {
            ColumnType::Datetime => Comparator::Datetime,
            ColumnType::Bool => Comparator::Bool,
            ColumnType::Bytes => Comparator::Bytes,
            ColumnType::String
            | ColumnType::Int
            | ColumnType::Float
            | ColumnType::Date
            | ColumnType::StringArray
            | ColumnType::IntArray
            | ColumnType::FloatArray
            | ColumnType::DatetimeArray
            | ColumnType::DateArray
            | ColumnType::BytesArray
            | ColumnType::BoolArray
            | ColumnType::NullArray => Comparator::Projection,
            ColumnType::Null => Comparator::Native,
        }
    }

    /// Compare two values. Only [`Comparator::Bytes`] can fail.
    pub fn equal(
        self,
        v1: &GenericColumnValue,
        v2: &GenericColumnValue,
    ) -> Result<bool, ComparisonError> {
        match self {
            Comparator::Datetime => Ok(v1.time() == v2.time()),
            Comparator::Bool => Ok(v1.bool() == v2.bool()),
            Comparator::Bytes => match (&v1.value, &v2.value) {
                (Value::Bytes(a), Value::Bytes(b)) => Ok(a == b),
                (a, b) => {
                    let offending = if matches!(a, Value::Bytes(_)) { b } else { a };
                    Err(ComparisonError {
                        column: v1.column.name.clone(),
                        column_type: ColumnType::Bytes,
                        reason: format!("expected raw bytes, got {}", offending.natural_type()),
                    })
                }
            },
            Comparator::Projection => Ok(v1.string() == v2.string()),
            Comparator::Native => Ok(v1.value == v2.value),
        }
    }
}

/// Compare two values sharing a column, dispatching on the first value's
/// declared type
pub fn equal(v1: &GenericColumnValue, v2: &GenericColumnValue) -> Result<bool, ComparisonError> {
    Comparator::for_type(v1.column_type()).equal(v1, v2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{zero_instant, Column};
    use chrono::{TimeZone, Utc};

    fn val(ty: ColumnType, v: impl Into<Value>) -> GenericColumnValue {
        GenericColumnValue::new(Column::new("c", 1, ty), v)
    }

    #[test]
    fn test_every_type_has_a_strategy() {
        for ty in ColumnType::ALL {
            let expected = match ty {
                ColumnType::Datetime => Comparator::Datetime,
                ColumnType::Bool => Comparator::Bool,
                ColumnType::Bytes => Comparator::Bytes,
                ColumnType::Null => Comparator::Native,
                _ => Comparator::Projection,
            };
            assert_eq!(Comparator::for_type(ty), expected, "{}", ty);
        }
    }

    #[test]
    fn test_projection_coercions() {
        assert!(equal(&val(ColumnType::Int, 12345i64), &val(ColumnType::String, "12345")).unwrap());
        assert!(equal(&val(ColumnType::Float, 123.45), &val(ColumnType::String, "123.45")).unwrap());
        assert!(equal(
            &val(ColumnType::StringArray, Value::array(["123", "456"])),
            &val(ColumnType::IntArray, Value::array([123i64, 456]))
        )
        .unwrap());
        assert!(equal(
            &val(ColumnType::String, "123,456,-789"),
            &val(ColumnType::IntArray, Value::array([123i64, 456, -789]))
        )
        .unwrap());
        assert!(!equal(&val(ColumnType::Int, 1i64), &val(ColumnType::Int, 2i64)).unwrap());
    }

    #[test]
    fn test_bool_coercions() {
        let t = val(ColumnType::Bool, true);
        assert!(equal(&t, &val(ColumnType::String, "true")).unwrap());
        assert!(equal(&t, &val(ColumnType::String, "1")).unwrap());
        assert!(equal(&t, &val(ColumnType::String, "TRUE")).unwrap());
        assert!(!equal(&t, &val(ColumnType::String, "0")).unwrap());
    }

    #[test]
    fn test_datetime_instants() {
        let ts = Utc.with_ymd_and_hms(2023, 6, 1, 12, 0, 0).unwrap();
        let typed = val(ColumnType::Datetime, ts);
        assert!(equal(&typed, &val(ColumnType::String, "2023-06-01T12:00:00Z")).unwrap());
        assert!(equal(&typed, &val(ColumnType::String, "2023-06-01T14:00:00+02:00")).unwrap());
        assert!(!equal(&typed, &val(ColumnType::String, "2023-06-01T12:00:01Z")).unwrap());
    }

    #[test]
    fn test_unparsable_datetimes_collapse_to_zero_instant() {
        let a = val(ColumnType::Datetime, "garbage");
        let b = val(ColumnType::Datetime, "other garbage");
        assert_eq!(a.time(), zero_instant());
        assert!(equal(&a, &b).unwrap());
    }

    #[test]
    fn test_bytes_require_raw_bytes() {
        let a = val(ColumnType::Bytes, b"\x00\x01".to_vec());
        assert!(equal(&a, &val(ColumnType::Bytes, b"\x00\x01".to_vec())).unwrap());
        assert!(!equal(&a, &val(ColumnType::Bytes, b"\x00".to_vec())).unwrap());

        let err = equal(&a, &val(ColumnType::Bytes, "\u{0}\u{1}")).unwrap_err();
        assert_eq!(err.column, "c");
        assert!(err.reason.contains("string"));
    }

    #[test]
    fn test_null_type_uses_native_equality() {
        assert!(equal(&val(ColumnType::Null, Value::Null), &val(ColumnType::Null, Value::Null)).unwrap());
        assert!(!equal(&val(ColumnType::Null, Value::Null), &val(ColumnType::Null, "")).unwrap());
    }
}
