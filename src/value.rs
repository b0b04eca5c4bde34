//! Helpers over `sea_query::Value`
//!
//! Row values, filter values and record properties are all plain
//! `sea_query::Value`s. A typed `None` of any variant is SQL `NULL`.

use sea_query::Value;
use serde_json::{json, Value as Json};

/// Untyped SQL `NULL`
pub fn null() -> Value {
    Value::String(None)
}

/// Whether the value is SQL `NULL`
pub fn is_null(value: &Value) -> bool {
    matches!(
        value,
        Value::Bool(None)
            | Value::TinyInt(None)
            | Value::SmallInt(None)
            | Value::Int(None)
            | Value::BigInt(None)
            | Value::TinyUnsigned(None)
            | Value::SmallUnsigned(None)
            | Value::Unsigned(None)
            | Value::BigUnsigned(None)
            | Value::Float(None)
            | Value::Double(None)
            | Value::String(None)
            | Value::Char(None)
            | Value::Bytes(None)
            | Value::Json(None)
            | Value::ChronoDateTimeUtc(None)
            | Value::ChronoDateTime(None)
            | Value::ChronoDate(None)
            | Value::ChronoTime(None)
    )
}

/// Short name of the value's type, used in type mismatch errors
pub fn type_name(value: &Value) -> &'static str {
    if is_null(value) {
        return "null";
    }
    match value {
        Value::Bool(_) => "bool",
        Value::TinyInt(_)
        | Value::SmallInt(_)
        | Value::Int(_)
        | Value::BigInt(_)
        | Value::TinyUnsigned(_)
        | Value::SmallUnsigned(_)
        | Value::Unsigned(_)
        | Value::BigUnsigned(_) => "integer",
        Value::Float(_) | Value::Double(_) => "float",
        Value::String(_) | Value::Char(_) => "string",
        Value::Bytes(_) => "bytes",
        Value::Json(_) => "json",
        Value::ChronoDateTimeUtc(_) | Value::ChronoDateTime(_) | Value::ChronoDate(_) | Value::ChronoTime(_) => {
            "datetime"
        }
        _ => "other",
    }
}

/// Integer payload of any integer variant
pub fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::TinyInt(Some(i)) => Some(i64::from(*i)),
        Value::SmallInt(Some(i)) => Some(i64::from(*i)),
        Value::Int(Some(i)) => Some(i64::from(*i)),
        Value::BigInt(Some(i)) => Some(*i),
        Value::TinyUnsigned(Some(u)) => Some(i64::from(*u)),
        Value::SmallUnsigned(Some(u)) => Some(i64::from(*u)),
        Value::Unsigned(Some(u)) => Some(i64::from(*u)),
        Value::BigUnsigned(Some(u)) => i64::try_from(*u).ok(),
        _ => None,
    }
}

/// JSON rendering used when serializing records
pub fn to_json(value: &Value) -> Json {
    if is_null(value) {
        return Json::Null;
    }
    if let Some(i) = as_i64(value) {
        return json!(i);
    }
    match value {
        Value::Bool(Some(b)) => json!(b),
        Value::BigUnsigned(Some(u)) => json!(u),
        Value::Float(Some(f)) => json!(f),
        Value::Double(Some(d)) => json!(d),
        Value::String(Some(s)) => json!(s),
        Value::Char(Some(c)) => json!(c.to_string()),
        Value::Bytes(Some(b)) => json!(b),
        Value::Json(Some(j)) => (**j).clone(),
        Value::ChronoDateTimeUtc(Some(dt)) => json!(dt.to_rfc3339()),
        Value::ChronoDateTime(Some(dt)) => json!(dt.to_string()),
        Value::ChronoDate(Some(d)) => json!(d.to_string()),
        Value::ChronoTime(Some(t)) => json!(t.to_string()),
        other => json!(format!("{:?}", other)),
    }
}
