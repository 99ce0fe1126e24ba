//! The coercion rules.
//!
//! | source \ target | string | integer | float | boolean | timestamp |
//! |---|---|---|---|---|---|
//! | string    | same   | parse  | parse  | parse  | parse per format |
//! | integer   | render | same   | widen  | -      | epoch |
//! | float     | render | -      | same   | -      | - |
//! | boolean   | render | -      | -      | same   | - |
//! | timestamp | render | -      | -      | -      | same |
//! | null, map, array | - | - | - | - | - |
//!
//! `-` is [`CoercionError::TypeMismatch`].

use crate::error::CoercionError;
use crate::options::{CoerceOptions, TargetType, TimestampFormat};
use crate::timestamp::{from_epoch, parse_timestamp};
use evkit_value::Value;

/// Convert `value` to `target`. The input is never modified.
///
/// A value already of the target type is returned as is.
///
/// # Errors
///
/// - [`CoercionError::InvalidFormat`] when a string is not a valid integer,
///   float or boolean literal.
/// - [`CoercionError::UnparseableTimestamp`] when a string matches no
///   timestamp format, or an epoch is out of range.
/// - [`CoercionError::TypeMismatch`] for every other pairing.
pub fn coerce(
    value: &Value,
    target: TargetType,
    options: &CoerceOptions,
) -> Result<Value, CoercionError> {
    coerce_with_format(value, target, &options.format, options)
}

pub(crate) fn coerce_with_format(
    value: &Value,
    target: TargetType,
    format: &TimestampFormat,
    options: &CoerceOptions,
) -> Result<Value, CoercionError> {
    if value.kind() == target.kind() {
        return Ok(value.clone());
    }
    match (target, value) {
        (_, Value::Null | Value::Map(_) | Value::Array(_)) => Err(mismatch(value, target)),

        (TargetType::String, scalar) => Ok(Value::String(scalar.to_string())),

        (TargetType::Integer, Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| invalid(target, s)),

        (TargetType::Float, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| invalid(target, s)),
        (TargetType::Float, Value::Integer(i)) => Ok(Value::Float(*i as f64)),

        (TargetType::Boolean, Value::String(s)) => {
            parse_bool(s).map(Value::Boolean).ok_or_else(|| invalid(target, s))
        }

        (TargetType::Timestamp, Value::String(s)) => {
            parse_timestamp(s, format, options).map(Value::Timestamp)
        }
        (TargetType::Timestamp, Value::Integer(i)) => from_epoch(*i, options.epoch_unit)
            .map(Value::Timestamp)
            .ok_or_else(|| CoercionError::unparseable(i.to_string(), "epoch value out of range")),

        (target, other) => Err(mismatch(other, target)),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "on" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn invalid(target: TargetType, input: &str) -> CoercionError {
    CoercionError::InvalidFormat {
        target,
        input: input.to_owned(),
    }
}

fn mismatch(value: &Value, target: TargetType) -> CoercionError {
    CoercionError::TypeMismatch {
        found: value.kind(),
        target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoercionErrorKind;
    use crate::timezone::TimeZone;
    use chrono::{TimeZone as _, Utc};
    use evkit_value::Kind;
    use serde_json::json;

    fn opts() -> CoerceOptions {
        CoerceOptions::default().with_timezone(TimeZone::utc())
    }

    fn to(value: impl Into<Value>, target: TargetType) -> Result<Value, CoercionError> {
        coerce(&value.into(), target, &opts())
    }

    #[test]
    fn same_type_is_identity() {
        let ts = Value::from(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(coerce(&ts, TargetType::Timestamp, &opts()).unwrap(), ts);
        assert_eq!(to(" padded ", TargetType::String).unwrap(), Value::from(" padded "));
        assert_eq!(to(7, TargetType::Integer).unwrap(), Value::Integer(7));
        assert_eq!(to(0.5, TargetType::Float).unwrap(), Value::Float(0.5));
        assert_eq!(to(true, TargetType::Boolean).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn strings_parse_to_integers() {
        assert_eq!(to("42", TargetType::Integer).unwrap(), Value::Integer(42));
        assert_eq!(to(" -7 ", TargetType::Integer).unwrap(), Value::Integer(-7));
        for bad in ["4.2", "", "0x10", "9223372036854775808"] {
            let err = to(bad, TargetType::Integer).unwrap_err();
            assert_eq!(
                err,
                CoercionError::InvalidFormat {
                    target: TargetType::Integer,
                    input: bad.into()
                }
            );
        }
    }

    #[test]
    fn strings_and_integers_become_floats() {
        assert_eq!(to("2.5", TargetType::Float).unwrap(), Value::Float(2.5));
        assert_eq!(to("1e3", TargetType::Float).unwrap(), Value::Float(1000.0));
        assert_eq!(to(3, TargetType::Float).unwrap(), Value::Float(3.0));
        assert_eq!(to("inf", TargetType::Float).unwrap(), Value::Float(f64::INFINITY));
        assert!(matches!(to("NaN", TargetType::Float).unwrap(), Value::Float(f) if f.is_nan()));
        assert_eq!(
            to("two", TargetType::Float).unwrap_err().kind(),
            CoercionErrorKind::InvalidFormat
        );
    }

    #[test]
    fn boolean_vocabulary() {
        for yes in ["true", "TRUE", "t", "Yes", "y", "on", "1"] {
            assert_eq!(to(yes, TargetType::Boolean).unwrap(), Value::Boolean(true), "{yes}");
        }
        for no in ["false", "F", "no", "N", "OFF", "0"] {
            assert_eq!(to(no, TargetType::Boolean).unwrap(), Value::Boolean(false), "{no}");
        }
        assert_eq!(
            to("maybe", TargetType::Boolean).unwrap_err().kind(),
            CoercionErrorKind::InvalidFormat
        );
        assert_eq!(
            to(1, TargetType::Boolean).unwrap_err(),
            CoercionError::TypeMismatch {
                found: Kind::Integer,
                target: TargetType::Boolean
            }
        );
    }

    #[test]
    fn scalars_render_as_strings() {
        assert_eq!(to(42, TargetType::String).unwrap(), Value::from("42"));
        assert_eq!(to(2.5, TargetType::String).unwrap(), Value::from("2.5"));
        assert_eq!(to(false, TargetType::String).unwrap(), Value::from("false"));
        let ts = Utc.with_ymd_and_hms(2020, 11, 1, 21, 15, 47).unwrap();
        assert_eq!(
            to(ts, TargetType::String).unwrap(),
            Value::from("2020-11-01T21:15:47+00:00")
        );
    }

    #[test]
    fn integers_are_epochs() {
        assert_eq!(
            to(1_604_265_347, TargetType::Timestamp).unwrap(),
            Value::from(Utc.with_ymd_and_hms(2020, 11, 1, 21, 15, 47).unwrap())
        );
        assert_eq!(
            to(i64::MAX, TargetType::Timestamp).unwrap_err().kind(),
            CoercionErrorKind::UnparseableTimestamp
        );
    }

    #[test]
    fn composites_and_null_never_coerce() {
        let map = Value::from(json!({"a": 1}));
        let array = Value::from(json!([1]));
        for target in [
            TargetType::String,
            TargetType::Integer,
            TargetType::Float,
            TargetType::Boolean,
            TargetType::Timestamp,
        ] {
            for v in [&map, &array, &Value::Null] {
                let err = coerce(v, target, &opts()).unwrap_err();
                assert_eq!(
                    err,
                    CoercionError::TypeMismatch {
                        found: v.kind(),
                        target
                    }
                );
            }
        }
    }

    #[test]
    fn lossy_pairs_are_type_mismatches() {
        assert_eq!(
            to(2.0, TargetType::Integer).unwrap_err().kind(),
            CoercionErrorKind::TypeMismatch
        );
        assert_eq!(
            to(1.5, TargetType::Timestamp).unwrap_err().kind(),
            CoercionErrorKind::TypeMismatch
        );
        assert_eq!(
            to(true, TargetType::Timestamp).unwrap_err().kind(),
            CoercionErrorKind::TypeMismatch
        );
        assert_eq!(
            to(true, TargetType::Float).unwrap_err().kind(),
            CoercionErrorKind::TypeMismatch
        );
    }

    #[test]
    fn input_is_left_untouched() {
        let original = Value::from("17");
        let copy = original.clone();
        let _ = coerce(&original, TargetType::Integer, &opts()).unwrap();
        assert_eq!(original, copy);
    }

    #[test]
    fn format_override_wins_over_options() {
        let v = Value::from("01.11.2020");
        assert!(coerce(&v, TargetType::Timestamp, &opts()).is_err());
        let custom = TimestampFormat::Custom("%d.%m.%Y".into());
        assert_eq!(
            coerce_with_format(&v, TargetType::Timestamp, &custom, &opts()).unwrap(),
            Value::from(Utc.with_ymd_and_hms(2020, 11, 1, 0, 0, 0).unwrap())
        );
    }
}
