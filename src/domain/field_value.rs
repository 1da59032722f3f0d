use chrono::{DateTime, Utc};
use serde::ser::{Error as _, Serialize, Serializer};
use std::collections::BTreeMap;

/// An opaque structured value carried by a log entry field.
///
/// Values are passed through the appender untouched; the only place their
/// shape matters is JSON encoding, where a non-finite float is rejected
/// instead of being silently turned into `null`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    Array(Vec<FieldValue>),
    Object(BTreeMap<String, FieldValue>),
}

impl Serialize for FieldValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            FieldValue::Null => serializer.serialize_unit(),
            FieldValue::Bool(value) => serializer.serialize_bool(*value),
            FieldValue::Int(value) => serializer.serialize_i64(*value),
            FieldValue::UInt(value) => serializer.serialize_u64(*value),
            FieldValue::Float(value) => {
                if !value.is_finite() {
                    return Err(S::Error::custom(format!(
                        "unsupported value: {value} is not representable in JSON"
                    )));
                }
                serializer.serialize_f64(*value)
            }
            FieldValue::String(value) => serializer.serialize_str(value),
            FieldValue::Timestamp(value) => value.serialize(serializer),
            FieldValue::Array(items) => serializer.collect_seq(items),
            FieldValue::Object(fields) => serializer.collect_map(fields),
        }
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::Bool(b) => FieldValue::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FieldValue::Int(i)
                } else if let Some(u) = n.as_u64() {
                    FieldValue::UInt(u)
                } else {
                    n.as_f64().map_or(FieldValue::Null, FieldValue::Float)
                }
            }
            serde_json::Value::String(s) => FieldValue::String(s),
            serde_json::Value::Array(items) => {
                FieldValue::Array(items.into_iter().map(FieldValue::from).collect())
            }
            serde_json::Value::Object(fields) => FieldValue::Object(
                fields
                    .into_iter()
                    .map(|(key, value)| (key, FieldValue::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::UInt(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(items: Vec<T>) -> Self {
        FieldValue::Array(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_scalars_serialize_as_json() {
        assert_eq!(serde_json::to_string(&FieldValue::Null).unwrap(), "null");
        assert_eq!(serde_json::to_string(&FieldValue::from(true)).unwrap(), "true");
        assert_eq!(serde_json::to_string(&FieldValue::from(-7_i64)).unwrap(), "-7");
        assert_eq!(serde_json::to_string(&FieldValue::from(1.5)).unwrap(), "1.5");
        assert_eq!(
            serde_json::to_string(&FieldValue::from("a\nb")).unwrap(),
            r#""a\nb""#
        );
    }

    #[test]
    fn test_timestamp_serializes_as_rfc3339() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            serde_json::to_string(&FieldValue::from(ts)).unwrap(),
            r#""2024-01-01T00:00:00Z""#
        );
    }

    #[test]
    fn test_non_finite_float_is_rejected() {
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(serde_json::to_string(&FieldValue::Float(value)).is_err());
        }

        let nested = FieldValue::Array(vec![FieldValue::from(1_i64), FieldValue::Float(f64::NAN)]);
        assert!(serde_json::to_string(&nested).is_err());
    }

    #[test]
    fn test_from_json_value_preserves_shape() {
        let json = serde_json::json!({
            "count": 3,
            "big": u64::MAX,
            "ratio": 0.25,
            "tags": ["a", "b"],
            "nested": {"ok": true, "none": null}
        });

        let value = FieldValue::from(json.clone());
        assert_eq!(serde_json::to_value(&value).unwrap(), json);

        let FieldValue::Object(fields) = value else {
            panic!("expected object");
        };
        assert_eq!(fields["count"], FieldValue::Int(3));
        assert_eq!(fields["big"], FieldValue::UInt(u64::MAX));
        assert_eq!(fields["ratio"], FieldValue::Float(0.25));
    }
}
