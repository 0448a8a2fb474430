//! Forgiving `deserialize_with` helpers for inbound update fields.
//!
//! Peers send numbers as JSON numbers, numeric strings, or booleans. Each
//! helper yields `None` for anything it cannot read instead of failing the
//! whole record, so one garbage field degrades to "missing" and the
//! sanitizer's fallback chain takes over.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::actor::ActorId;

/// Reads a finite `f64` from a number, numeric string, or boolean.
pub fn scalar(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Reads a boolean from a boolean, number (non-zero is true), or string.
pub fn truthy(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|v| v != 0.0),
        Value::String(s) => match s.trim() {
            "true" | "1" => Some(true),
            "false" | "0" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Reads a non-negative whole number.
pub fn whole(value: &Value) -> Option<u64> {
    scalar(value)
        .filter(|v| *v >= 0.0 && *v <= u64::MAX as f64)
        .map(|v| v.floor() as u64)
}

/// `deserialize_with` for optional numbers.
pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(scalar))
}

/// `deserialize_with` for optional flags.
pub fn flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(truthy))
}

/// `deserialize_with` for optional counters and timestamps.
pub fn counter<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(whole))
}

/// `deserialize_with` for the actor identity.
pub fn actor_id<'de, D>(deserializer: D) -> Result<Option<ActorId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(whole)
        .map(ActorId))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_accepts_strings_and_bools() {
        assert_eq!(scalar(&json!(12.5)), Some(12.5));
        assert_eq!(scalar(&json!(" 7 ")), Some(7.0));
        assert_eq!(scalar(&json!(true)), Some(1.0));
        assert_eq!(scalar(&json!("abc")), None);
        assert_eq!(scalar(&json!("NaN")), None);
        assert_eq!(scalar(&json!(null)), None);
        assert_eq!(scalar(&json!([1])), None);
    }

    #[test]
    fn test_truthy() {
        assert_eq!(truthy(&json!(1)), Some(true));
        assert_eq!(truthy(&json!(0)), Some(false));
        assert_eq!(truthy(&json!("true")), Some(true));
        assert_eq!(truthy(&json!("maybe")), None);
    }

    #[test]
    fn test_whole_rejects_negative() {
        assert_eq!(whole(&json!(-1)), None);
        assert_eq!(whole(&json!(9.7)), Some(9));
        assert_eq!(whole(&json!("11")), Some(11));
    }
}
