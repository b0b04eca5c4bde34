use crate::behavior::{Behavior, PropertyBehavior};
use crate::error::{OrmError, Result};
use crate::value;
use chrono::{DateTime, Utc};
use sea_query::Value;

/// Stores instants as integer milliseconds since the Unix epoch
#[derive(Debug, Clone)]
pub struct MillisecondTimestamp {
    properties: Vec<String>,
}

impl MillisecondTimestamp {
    pub fn new<I, S>(properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            properties: properties.into_iter().map(Into::into).collect(),
        }
    }

    fn mismatch(key: &str, expected: &'static str, value: &Value) -> OrmError {
        OrmError::TypeMismatch {
            behavior: "MillisecondTimestamp",
            key: key.to_owned(),
            expected,
            actual: value::type_name(value).to_owned(),
        }
    }
}

impl PropertyBehavior for MillisecondTimestamp {
    fn properties(&self) -> Vec<&str> {
        self.properties.iter().map(String::as_str).collect()
    }

    fn retrieve_property(&self, value: Value, key: &str) -> Result<Value> {
        if value::is_null(&value) || matches!(value, Value::ChronoDateTimeUtc(Some(_))) {
            return Ok(value);
        }
        value::as_i64(&value)
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(Value::from)
            .ok_or_else(|| Self::mismatch(key, "milliseconds", &value))
    }

    fn persist_property(&self, value: Value, key: &str) -> Result<Value> {
        if value::is_null(&value) || value::as_i64(&value).is_some() {
            return Ok(value);
        }
        match &value {
            Value::ChronoDateTimeUtc(Some(instant)) => Ok(Value::from(instant.timestamp_millis())),
            _ => Err(Self::mismatch(key, "datetime", &value)),
        }
    }
}

impl Behavior for MillisecondTimestamp {
    fn name(&self) -> &'static str {
        "millisecond_timestamp"
    }

    fn as_property(&self) -> Option<&dyn PropertyBehavior> {
        Some(self)
    }
}
