//! Native values and column-typed value views

use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use super::schema::{Column, ColumnType};

/// A value as a source produced it, before any column-type interpretation
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    Array(Vec<Value>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => {
                // Handle NaN comparison
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b
                }
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            // Cross-type numeric comparison
            (Value::Int(a), Value::Float(b)) => (*a as f64) == *b,
            (Value::Float(a), Value::Int(b)) => *a == (*b as f64),
            _ => false,
        }
    }
}

impl Value {
    /// Build an array value from anything convertible to values
    pub fn array<I, T>(items: I) -> Value
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::Array(items.into_iter().map(Into::into).collect())
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Canonical string projection.
    ///
    /// Arrays project to the comma-joined projections of their elements, so
    /// `[123, 456]` and `"123,456"` project identically. Null projects to the
    /// empty string.
    pub fn display(&self) -> Cow<'_, str> {
        match self {
            Value::Null => Cow::Borrowed(""),
            Value::Bool(b) => Cow::Owned(b.to_string()),
            Value::Int(i) => Cow::Owned(i.to_string()),
            Value::Float(f) => Cow::Owned(f.to_string()),
            Value::String(s) => Cow::Borrowed(s.as_str()),
            Value::Bytes(b) => String::from_utf8_lossy(b),
            Value::Timestamp(ts) => Cow::Owned(ts.to_rfc3339()),
            Value::Date(d) => Cow::Owned(d.format("%Y-%m-%d").to_string()),
            Value::Array(items) => Cow::Owned(
                items
                    .iter()
                    .map(|v| v.display())
                    .collect::<Vec<_>>()
                    .join(","),
            ),
        }
    }

    /// Column type a source would naturally declare for this value
    pub fn natural_type(&self) -> ColumnType {
        match self {
            Value::Null => ColumnType::Null,
            Value::Bool(_) => ColumnType::Bool,
            Value::Int(_) => ColumnType::Int,
            Value::Float(_) => ColumnType::Float,
            Value::String(_) => ColumnType::String,
            Value::Bytes(_) => ColumnType::Bytes,
            Value::Timestamp(_) => ColumnType::Datetime,
            Value::Date(_) => ColumnType::Date,
            Value::Array(items) => items
                .iter()
                .fold(ColumnType::Null, |acc, v| acc.widen(v.natural_type().element_type()))
                .array_of(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(ts: DateTime<Utc>) -> Self {
        Value::Timestamp(ts)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

/// Instant unparsable datetimes degrade to: 0001-01-01T00:00:00Z
pub fn zero_instant() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S%.f",
];

const OFFSET_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f %:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%Y%m%d"];

/// Permissive date/time parsing into an absolute instant.
///
/// Values without an offset are taken as UTC. All-digit strings that are not
/// a compact `YYYYMMDD` date are read as Unix seconds.
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    // Trailing UTC marker, e.g. "2024-01-02 03:04:05 UTC"
    let stripped = s
        .strip_suffix(" UTC")
        .or_else(|| s.strip_suffix('Z'))
        .unwrap_or(s);
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(stripped, fmt) {
            return Some(Utc.from_utc_datetime(&dt));
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt));
        }
    }
    if s.bytes().all(|b| b.is_ascii_digit()) {
        return s
            .parse::<i64>()
            .ok()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single());
    }
    None
}

/// A native value bound to the column it was read for.
///
/// The column's declared type decides interpretation: the same logical value
/// can arrive as an int from one store and a string from another.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericColumnValue {
    pub column: Column,
    pub value: Value,
}

impl GenericColumnValue {
    pub fn new(column: Column, value: impl Into<Value>) -> Self {
        Self {
            column,
            value: value.into(),
        }
    }

    pub fn column_type(&self) -> ColumnType {
        self.column.column_type
    }

    /// Canonical string projection of the value
    pub fn string(&self) -> Cow<'_, str> {
        self.value.display()
    }

    /// The value as an absolute instant; unparsable values become
    /// [`zero_instant`].
    pub fn time(&self) -> DateTime<Utc> {
        let parsed = match &self.value {
            Value::Timestamp(ts) => Some(*ts),
            Value::Date(d) => d.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt)),
            Value::Int(secs) => Utc.timestamp_opt(*secs, 0).single(),
            other => parse_instant(&other.display()),
        };
        parsed.unwrap_or_else(|| {
            tracing::warn!(
                column = %self.column.name,
                value = %self.value,
                "unparsable datetime, using zero instant"
            );
            zero_instant()
        })
    }

    /// The value as a boolean: native bools directly, then "true"/"false" in
    /// any case, then integers with nonzero meaning true. Anything else is
    /// false.
    pub fn bool(&self) -> bool {
        if let Value::Bool(b) = self.value {
            return b;
        }
        let projected = self.string().trim().to_lowercase();
        match projected.as_str() {
            "true" => true,
            "false" => false,
            other => other.parse::<i64>().map(|i| i != 0).unwrap_or(false),
        }
    }
}

impl fmt::Display for GenericColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(ty: ColumnType) -> Column {
        Column::new("c", 1, ty)
    }

    #[test]
    fn test_display_projection() {
        assert_eq!(Value::Int(12345).display(), "12345");
        assert_eq!(Value::Float(123.45).display(), "123.45");
        assert_eq!(Value::Bool(true).display(), "true");
        assert_eq!(Value::Null.display(), "");
        assert_eq!(Value::array([123i64, 456, -789]).display(), "123,456,-789");
        assert_eq!(Value::array(["a", "b"]).display(), "a,b");
        assert_eq!(
            Value::Date(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()).display(),
            "2024-03-09"
        );
    }

    #[test]
    fn test_bytes_stay_bytes() {
        assert_eq!(Value::from(b"abc".to_vec()), Value::Bytes(b"abc".to_vec()));
    }

    #[test]
    fn test_native_equality() {
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_eq!(Value::Int(2), Value::Float(2.0));
        assert_ne!(Value::Int(2), Value::from("2"));
    }

    #[test]
    fn test_natural_type() {
        assert_eq!(Value::array([1i64, 2]).natural_type(), ColumnType::IntArray);
        assert_eq!(
            Value::Array(vec![Value::Int(1), Value::Float(1.5)]).natural_type(),
            ColumnType::FloatArray
        );
        assert_eq!(Value::Array(vec![]).natural_type(), ColumnType::NullArray);
    }

    #[test]
    fn test_parse_instant_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(parse_instant("2024-01-02T03:04:05Z"), Some(expected));
        assert_eq!(parse_instant("2024-01-02T05:04:05+02:00"), Some(expected));
        assert_eq!(parse_instant("2024-01-02 03:04:05"), Some(expected));
        assert_eq!(parse_instant("2024-01-02 03:04:05 UTC"), Some(expected));
        assert_eq!(parse_instant("2024-01-02 03:04:05+00:00"), Some(expected));
        assert_eq!(
            parse_instant("2024-01-02"),
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_instant("1704164645"), Some(expected));
        assert_eq!(parse_instant("not a date"), None);
    }

    #[test]
    fn test_time_view() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let typed = GenericColumnValue::new(col(ColumnType::Datetime), expected);
        let text = GenericColumnValue::new(col(ColumnType::Datetime), "2024-01-02 03:04:05");
        assert_eq!(typed.time(), text.time());

        let garbage = GenericColumnValue::new(col(ColumnType::Datetime), "garbage");
        assert_eq!(garbage.time(), zero_instant());
    }

    #[test]
    fn test_bool_view() {
        let t = |v: Value| GenericColumnValue::new(col(ColumnType::Bool), v).bool();
        assert!(t(Value::Bool(true)));
        assert!(t("TRUE".into()));
        assert!(t("1".into()));
        assert!(t(Value::Int(-3)));
        assert!(!t("false".into()));
        assert!(!t("0".into()));
        assert!(!t("maybe".into()));
        assert!(!t(Value::Null));
    }
}
