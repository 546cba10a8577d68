//! Lenient decoders for values the firmware emits in more than one shape.
//!
//! These are used through `#[serde(deserialize_with = ...)]` on the wire
//! types, and are public so callers decoding ad-hoc JSON apply the same rules.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::WireError;

/// Firmware truthiness: only `true` and the string `"true"` are true.
///
/// Anything else, `null` included, is false.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s == "true",
        _ => false,
    }
}

/// Render a scalar as text. `null` becomes the empty string.
pub fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Extract an integer from a number or from the leading digits of a string
/// (`"1234 raw"` yields 1234).
pub fn leading_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => parse_leading_int(s),
        _ => None,
    }
}

/// Extract a float from a number or a numeric string; anything else is 0.
pub fn number_or_zero(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite()).unwrap_or(0.0)
}

fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let end = s
        .char_indices()
        .take_while(|(i, c)| c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+')))
        .map(|(i, c)| i + c.len_utf8())
        .last()?;
    s[..end].parse().ok()
}

/// Decode `text` as a JSON object into `T`.
///
/// Serde would happily read a struct from a JSON array, so the object check
/// is done up front.
pub fn decode_object<T: DeserializeOwned>(text: &str) -> Result<T, WireError> {
    let value: Value = serde_json::from_str(text)?;
    decode_value(value)
}

/// Decode an already-parsed JSON value into `T`, requiring an object.
pub fn decode_value<T: DeserializeOwned>(value: Value) -> Result<T, WireError> {
    if !value.is_object() {
        return Err(WireError::NotAnObject(kind(&value)));
    }
    Ok(serde_json::from_value(value)?)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub(crate) fn bool_lenient<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(truthy(&value))
}

pub(crate) fn opt_bool_lenient<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(Some(truthy(&value)))
}

pub(crate) fn string_lenient<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(text(&value))
}

pub(crate) fn opt_string_lenient<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(Some(text(&value)))
}

pub(crate) fn rssi_lenient<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(d)?;
    leading_int(&value).ok_or_else(|| D::Error::custom(format!("invalid rssi value: {value}")))
}

pub(crate) fn rssi_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(leading_int(&value).unwrap_or(0))
}

pub(crate) fn opt_rssi_lenient<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    rssi_lenient(d).map(Some)
}

pub(crate) fn f64_lenient<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(number_or_zero(&value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthy_accepts_bool_and_string() {
        assert!(truthy(&json!(true)));
        assert!(truthy(&json!("true")));
        assert!(!truthy(&json!(false)));
        assert!(!truthy(&json!("false")));
    }

    #[test]
    fn truthy_rejects_everything_else() {
        assert!(!truthy(&json!(null)));
        assert!(!truthy(&json!(1)));
        assert!(!truthy(&json!("TRUE")));
        assert!(!truthy(&json!("yes")));
    }

    #[test]
    fn leading_int_from_number_and_suffixed_string() {
        assert_eq!(leading_int(&json!(1234)), Some(1234));
        assert_eq!(leading_int(&json!(12.9)), Some(12));
        assert_eq!(leading_int(&json!("1234 raw")), Some(1234));
        assert_eq!(leading_int(&json!("  -5dB")), Some(-5));
    }

    #[test]
    fn leading_int_rejects_non_numeric() {
        assert_eq!(leading_int(&json!("raw")), None);
        assert_eq!(leading_int(&json!("-")), None);
        assert_eq!(leading_int(&json!(null)), None);
        assert_eq!(leading_int(&json!(true)), None);
    }

    #[test]
    fn number_or_zero_parses_strings() {
        assert_eq!(number_or_zero(&json!(2.5)), 2.5);
        assert_eq!(number_or_zero(&json!("2.5")), 2.5);
        assert_eq!(number_or_zero(&json!(" 10 ")), 10.0);
        assert_eq!(number_or_zero(&json!("ten")), 0.0);
        assert_eq!(number_or_zero(&json!(null)), 0.0);
    }

    #[test]
    fn rssi_strict_and_lenient_readers() {
        #[derive(Deserialize)]
        struct Strict(#[serde(deserialize_with = "rssi_lenient")] i64);
        #[derive(Deserialize)]
        struct Lenient(#[serde(deserialize_with = "rssi_or_zero")] i64);

        assert!(serde_json::from_value::<Strict>(json!("")).is_err());
        assert_eq!(serde_json::from_value::<Strict>(json!("812 raw")).unwrap().0, 812);
        assert_eq!(serde_json::from_value::<Lenient>(json!("")).unwrap().0, 0);
        assert_eq!(serde_json::from_value::<Lenient>(json!(null)).unwrap().0, 0);
        assert_eq!(serde_json::from_value::<Lenient>(json!("812 raw")).unwrap().0, 812);
    }

    #[test]
    fn text_renders_scalars() {
        assert_eq!(text(&json!("Stand By")), "Stand By");
        assert_eq!(text(&json!(null)), "");
        assert_eq!(text(&json!(42)), "42");
    }

    #[test]
    fn decode_object_rejects_arrays() {
        let result: Result<serde_json::Map<String, Value>, _> = decode_object("[1, 2]");
        assert!(matches!(result, Err(WireError::NotAnObject("array"))));
    }

    #[test]
    fn decode_object_rejects_garbage() {
        let result: Result<serde_json::Map<String, Value>, _> = decode_object("{not json");
        assert!(matches!(result, Err(WireError::Json(_))));
    }
}
