//! Basic memory controller: one plain map per value kind.

use super::{MemoryItems, ResourceStore, Value, ValueKind};
use crate::error::MemoryError;
use chrono::{NaiveDateTime, Utc};
use tracing::debug;

/// Timestamp layout accepted for `time` resources, e.g. `Jan  2 15:04:05`.
///
/// The layout carries no year; parsed stamps land in year 0, UTC.
const TIME_STAMP_FORMAT: &str = "%b %e %H:%M:%S";

pub(super) fn build_basic(items: &MemoryItems) -> Result<ResourceStore, MemoryError> {
    let mut store = ResourceStore::new();
    for (kind_name, resources) in items {
        let kind = ValueKind::from_name(kind_name)
            .ok_or_else(|| MemoryError::UnknownKind(kind_name.clone()))?;
        for (resource, init) in resources {
            let value = match init.single() {
                Ok(None) => default_value(kind),
                Ok(Some(text)) => parse_value(kind, resource, text)?,
                Err(_) => {
                    return Err(MemoryError::TooManyValues {
                        kind,
                        resource: resource.clone(),
                    })
                }
            };
            store.insert(resource.clone(), value);
        }
    }
    debug!(resources = store.len(), "Built basic memory");
    Ok(store)
}

/// Default value used when a resource has no initialization text.
fn default_value(kind: ValueKind) -> Value {
    match kind {
        ValueKind::Bool => Value::Bool(false),
        ValueKind::Integer => Value::Integer(0),
        ValueKind::Float => Value::Float(0.0),
        ValueKind::Text => Value::Text(String::new()),
        ValueKind::Time => Value::Time(Utc::now()),
    }
}

/// Parse `text` with the canonical textual format of `kind`.
pub fn parse_value(kind: ValueKind, resource: &str, text: &str) -> Result<Value, MemoryError> {
    let invalid = || MemoryError::InvalidValue {
        kind,
        resource: resource.to_string(),
        value: text.to_string(),
    };
    match kind {
        ValueKind::Bool => match text {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(invalid()),
        },
        ValueKind::Integer => text.parse::<i64>().map(Value::Integer).map_err(|_| invalid()),
        ValueKind::Float => match text.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Value::Float(v)),
            _ => Err(invalid()),
        },
        ValueKind::Text => Ok(Value::Text(text.to_string())),
        ValueKind::Time => {
            let stamped = format!("0000 {}", text.trim());
            NaiveDateTime::parse_from_str(&stamped, &format!("%Y {}", TIME_STAMP_FORMAT))
                .map(|naive| Value::Time(naive.and_utc()))
                .map_err(|_| invalid())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use proptest::prelude::*;

    #[test]
    fn test_parse_bool_is_strict() {
        assert_eq!(
            parse_value(ValueKind::Bool, "b", "true").unwrap(),
            Value::Bool(true)
        );
        assert!(parse_value(ValueKind::Bool, "b", "yes").is_err());
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(
            parse_value(ValueKind::Float, "f", "-3.25").unwrap(),
            Value::Float(-3.25)
        );
        assert!(parse_value(ValueKind::Float, "f", "1,5").is_err());
    }

    #[test]
    fn test_parse_float_rejects_non_finite() {
        for text in ["NaN", "nan", "inf", "-inf", "infinity", "1e999"] {
            assert!(
                matches!(
                    parse_value(ValueKind::Float, "f", text),
                    Err(MemoryError::InvalidValue { .. })
                ),
                "{} must be rejected",
                text
            );
        }
    }

    #[test]
    fn test_parse_time_stamp() {
        let Value::Time(stamp) = parse_value(ValueKind::Time, "t", "Jan  2 15:04:05").unwrap()
        else {
            panic!("expected a time value");
        };
        assert_eq!(stamp.year(), 0);
        assert_eq!(stamp.month(), 1);
        assert_eq!(stamp.day(), 2);
        assert_eq!((stamp.hour(), stamp.minute(), stamp.second()), (15, 4, 5));

        let Value::Time(padded) = parse_value(ValueKind::Time, "t", "Mar 14 08:00:00").unwrap()
        else {
            panic!("expected a time value");
        };
        assert_eq!((padded.month(), padded.day()), (3, 14));
    }

    #[test]
    fn test_parse_time_rejects_other_layouts() {
        let err = parse_value(ValueKind::Time, "t", "2024-01-02T15:04:05Z").unwrap_err();
        assert_eq!(
            err,
            MemoryError::InvalidValue {
                kind: ValueKind::Time,
                resource: "t".to_string(),
                value: "2024-01-02T15:04:05Z".to_string(),
            }
        );
    }

    proptest! {
        #[test]
        fn prop_any_decimal_integer_initializes(n in any::<i64>()) {
            let value = parse_value(ValueKind::Integer, "n", &n.to_string()).unwrap();
            prop_assert_eq!(value, Value::Integer(n));
        }
    }
}
