//! Field values carried by entity attributes

use crate::core::error::ProjectionError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Legacy marker for an unset date column. Rendered as null instead of a
/// timestamp.
pub const ZERO_DATE: &str = "0000-00-00 00:00:00";

/// A polymorphic field value that can hold different types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Uuid(Uuid),
    DateTime(DateTime<Utc>),
    Null,
}

impl FieldValue {
    /// Get the value as a string if possible
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer if possible
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the value as a UUID if possible
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            FieldValue::Uuid(u) => Some(*u),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Render the value into the produced tree.
    ///
    /// Temporal values become ISO-8601 strings; the [`ZERO_DATE`] sentinel
    /// becomes null.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::String(s) if s == ZERO_DATE => Value::Null,
            FieldValue::String(s) => Value::String(s.clone()),
            FieldValue::Integer(i) => Value::from(*i),
            FieldValue::Float(f) => {
                serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number)
            }
            FieldValue::Boolean(b) => Value::Bool(*b),
            FieldValue::Uuid(u) => Value::String(u.to_string()),
            FieldValue::DateTime(dt) => {
                Value::String(dt.to_rfc3339_opts(SecondsFormat::Micros, true))
            }
            FieldValue::Null => Value::Null,
        }
    }

    /// Render the value coerced to a declared cast type.
    ///
    /// Supported casts: `int`/`integer` and `real`/`float`/`double`. Any
    /// other cast name fails with [`ProjectionError::UnknownCastType`].
    pub fn cast(&self, cast: &str, field: &str) -> Result<Value, ProjectionError> {
        match cast {
            "int" | "integer" => Ok(Value::from(self.coerce_integer())),
            "real" | "float" | "double" => Ok(serde_json::Number::from_f64(self.coerce_float())
                .map_or(Value::Null, Value::Number)),
            other => Err(ProjectionError::UnknownCastType {
                cast: other.to_string(),
                field: field.to_string(),
            }),
        }
    }

    fn coerce_integer(&self) -> i64 {
        match self {
            FieldValue::Integer(i) => *i,
            FieldValue::Float(f) => *f as i64,
            FieldValue::Boolean(b) => *b as i64,
            FieldValue::String(s) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }

    fn coerce_float(&self) -> f64 {
        match self {
            FieldValue::Integer(i) => *i as f64,
            FieldValue::Float(f) => *f,
            FieldValue::Boolean(b) => (*b as i64) as f64,
            FieldValue::String(s) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<Uuid> for FieldValue {
    fn from(value: Uuid) -> Self {
        FieldValue::Uuid(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::DateTime(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_field_value_string() {
        let value = FieldValue::String("test".to_string());
        assert_eq!(value.as_str(), Some("test"));
        assert_eq!(value.as_integer(), None);
        assert!(!value.is_null());
    }

    #[test]
    fn test_field_value_integer() {
        let value = FieldValue::Integer(42);
        assert_eq!(value.as_integer(), Some(42));
        assert_eq!(value.as_str(), None);
    }

    #[test]
    fn test_datetime_renders_iso_8601() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let value = FieldValue::DateTime(dt);
        assert_eq!(value.to_json(), json!("2024-03-01T12:30:00.000000Z"));
    }

    #[test]
    fn test_zero_date_renders_null() {
        let value = FieldValue::String(ZERO_DATE.to_string());
        assert_eq!(value.to_json(), Value::Null);
    }

    #[test]
    fn test_ordinary_string_is_untouched() {
        let value = FieldValue::String("2024-03-01".to_string());
        assert_eq!(value.to_json(), json!("2024-03-01"));
    }

    #[test]
    fn test_cast_to_integer() {
        assert_eq!(
            FieldValue::String("17".into()).cast("int", "qty").unwrap(),
            json!(17)
        );
        assert_eq!(FieldValue::Float(3.9).cast("integer", "qty").unwrap(), json!(3));
        assert_eq!(FieldValue::Null.cast("int", "qty").unwrap(), json!(0));
    }

    #[test]
    fn test_cast_to_float() {
        assert_eq!(
            FieldValue::String("2.5".into()).cast("float", "price").unwrap(),
            json!(2.5)
        );
        assert_eq!(FieldValue::Integer(2).cast("double", "price").unwrap(), json!(2.0));
    }

    #[test]
    fn test_cast_unknown_type_fails() {
        let err = FieldValue::Integer(1).cast("bool", "flag").unwrap_err();
        assert!(matches!(err, ProjectionError::UnknownCastType { .. }));
        assert!(err.to_string().contains("bool"));
        assert!(err.to_string().contains("flag"));
    }

    #[test]
    fn test_uuid_renders_string() {
        let id = Uuid::nil();
        assert_eq!(
            FieldValue::Uuid(id).to_json(),
            json!("00000000-0000-0000-0000-000000000000")
        );
    }
}
