use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Declared type of a schema field. Every field is nullable regardless of type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Int,
    Float,
    Boolean,
    Date,
    Time,
    DateTime,
}

impl ValueType {
    pub const ALL: [ValueType; 7] = [
        Self::String,
        Self::Int,
        Self::Float,
        Self::Boolean,
        Self::Date,
        Self::Time,
        Self::DateTime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "datetime",
        }
    }

    /// Date and time variants have no native counterpart in the provider's
    /// response schema and travel as ISO-8601 strings.
    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::Time | Self::DateTime)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single extracted cell.
///
/// Serializes untagged: `Null` as JSON `null`, temporal values as ISO-8601
/// strings, everything else as the matching JSON scalar.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
}

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M:%S%.f", "%H:%M"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Convert a JSON value without a declared type.
    ///
    /// Arrays and objects have no cell representation and are kept as their
    /// JSON text.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => n.as_f64().map_or(Self::Null, Self::Float),
            },
            serde_json::Value::String(s) => Self::Str(s.clone()),
            other => Self::Str(other.to_string()),
        }
    }

    /// Coerce a JSON value toward the declared type.
    ///
    /// Only lossless coercions are applied (integer to float, whole float to
    /// integer, ISO strings to temporal values). A value that does not fit the
    /// declared type is kept as returned.
    pub fn coerce(json: &serde_json::Value, declared: ValueType) -> Self {
        match (declared, json) {
            (_, serde_json::Value::Null) => Self::Null,
            (ValueType::Float, serde_json::Value::Number(n)) => {
                n.as_f64().map_or(Self::Null, Self::Float)
            }
            (ValueType::Int, serde_json::Value::Number(n)) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Self::Int(f as i64),
                    Some(f) => Self::Float(f),
                    None => Self::Null,
                },
            },
            (ValueType::Date, serde_json::Value::String(s)) => {
                parse_date(s).map_or_else(|| Self::Str(s.clone()), Self::Date)
            }
            (ValueType::Time, serde_json::Value::String(s)) => {
                parse_time(s).map_or_else(|| Self::Str(s.clone()), Self::Time)
            }
            (ValueType::DateTime, serde_json::Value::String(s)) => {
                parse_datetime(s).map_or_else(|| Self::Str(s.clone()), Self::DateTime)
            }
            _ => Self::from_json(json),
        }
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Self::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_stays_null_for_every_type() {
        for ty in ValueType::ALL {
            assert_eq!(Value::coerce(&json!(null), ty), Value::Null);
        }
    }

    #[test]
    fn float_accepts_integer_numbers() {
        assert_eq!(Value::coerce(&json!(42), ValueType::Float), Value::Float(42.0));
        assert_eq!(Value::coerce(&json!(42.5), ValueType::Float), Value::Float(42.5));
    }

    #[test]
    fn int_accepts_whole_floats_only() {
        assert_eq!(Value::coerce(&json!(7.0), ValueType::Int), Value::Int(7));
        assert_eq!(Value::coerce(&json!(7.25), ValueType::Int), Value::Float(7.25));
    }

    #[test]
    fn mismatched_type_is_kept_as_returned() {
        assert_eq!(
            Value::coerce(&json!("42.5"), ValueType::Float),
            Value::Str("42.5".into())
        );
        assert_eq!(Value::coerce(&json!(1), ValueType::Boolean), Value::Int(1));
        assert_eq!(Value::coerce(&json!(true), ValueType::String), Value::Bool(true));
    }

    #[test]
    fn temporal_strings_are_parsed() {
        assert_eq!(
            Value::coerce(&json!("2024-01-15"), ValueType::Date),
            Value::Date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
        );
        assert_eq!(
            Value::coerce(&json!("08:30"), ValueType::Time),
            Value::Time(NaiveTime::from_hms_opt(8, 30, 0).unwrap())
        );
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(9, 45, 0)
            .unwrap();
        assert_eq!(
            Value::coerce(&json!("2024-01-15T09:45:00"), ValueType::DateTime),
            Value::DateTime(expected)
        );
        assert_eq!(
            Value::coerce(&json!("2024-01-15T09:45:00+02:00"), ValueType::DateTime),
            Value::DateTime(expected)
        );
    }

    #[test]
    fn unparseable_date_is_kept_as_string() {
        assert_eq!(
            Value::coerce(&json!("mid January"), ValueType::Date),
            Value::Str("mid January".into())
        );
    }

    #[test]
    fn nested_json_becomes_text() {
        let value = Value::from_json(&json!({"a": 1}));
        assert_eq!(value, Value::Str(r#"{"a":1}"#.into()));
    }

    #[test]
    fn serializes_untagged() {
        let date = Value::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(serde_json::to_value(&date).unwrap(), json!("2024-03-01"));
        assert_eq!(serde_json::to_value(Value::Null).unwrap(), json!(null));
        assert_eq!(serde_json::to_value(Value::Float(1.5)).unwrap(), json!(1.5));
    }

    #[test]
    fn display_formats() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Float(42.5).to_string(), "42.5");
        assert_eq!(Value::Bool(false).to_string(), "false");
    }
}
