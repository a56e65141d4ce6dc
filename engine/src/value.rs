//! JSON value ordering and query-string coercion.

use crate::{error::Result, Error, FieldType};
use serde_json::Value;
use std::cmp::Ordering;

/// Rank of a JSON type in the cross-type ordering.
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::String(_) => 1,
        Value::Number(_) => 2,
        Value::Bool(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Compare two JSON values under a total order.
///
/// Values of different types order by type: null, string, number, bool,
/// array, object, which is also PostgreSQL's `jsonb` order. Numbers compare
/// numerically and strings lexicographically. Arrays compare by length,
/// then element-wise. Objects only compare by size; they are never
/// meaningful sort keys.
pub fn compare_values(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Array(a), Value::Array(b)) => a.len().cmp(&b.len()).then_with(|| {
            a.iter()
                .zip(b.iter())
                .map(|(x, y)| compare_values(x, y))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        }),
        (Value::Object(a), Value::Object(b)) => a.len().cmp(&b.len()),
        _ => type_rank(left).cmp(&type_rank(right)),
    }
}

fn compare_numbers(a: &serde_json::Number, b: &serde_json::Number) -> Ordering {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x.cmp(&y);
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x.cmp(&y);
    }
    let x = a.as_f64().unwrap_or(f64::NAN);
    let y = b.as_f64().unwrap_or(f64::NAN);
    x.total_cmp(&y)
}

/// Resolve a dot-separated path inside a JSON object map.
pub fn resolve_path<'a>(
    fields: &'a serde_json::Map<String, Value>,
    segments: &[String],
) -> Option<&'a Value> {
    let (head, rest) = segments.split_first()?;
    let mut current = fields.get(head)?;
    for segment in rest {
        current = current.get(segment)?;
    }
    Some(current)
}

/// Convert a raw query-string token into a value of the field's type.
pub fn coerce_param(field: &str, field_type: FieldType, raw: &str) -> Result<Value> {
    let mismatch = || Error::TypeMismatch {
        field: field.to_string(),
        expected: field_type.to_string(),
        got: format!("'{raw}'"),
    };

    match field_type {
        FieldType::String => Ok(Value::String(raw.to_string())),
        FieldType::Int | FieldType::Timestamp => raw
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| mismatch()),
        FieldType::Float => {
            let f = raw.parse::<f64>().map_err(|_| mismatch())?;
            serde_json::Number::from_f64(f)
                .map(Value::Number)
                .ok_or_else(mismatch)
        }
        FieldType::Bool => match raw {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => Err(mismatch()),
        },
        FieldType::Json => {
            Ok(serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())))
        }
        // Without a known target id type, numeric tokens are integer ids.
        FieldType::Reference => Ok(raw
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string()))),
    }
}
