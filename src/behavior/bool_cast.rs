use crate::behavior::{Behavior, PropertyBehavior};
use crate::error::{OrmError, Result};
use crate::value;
use sea_query::Value;

/// Stores booleans as `'y'` / `'n'` text
#[derive(Debug, Clone)]
pub struct BoolCast {
    properties: Vec<String>,
}

impl BoolCast {
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
            behavior: "BoolCast",
            key: key.to_owned(),
            expected,
            actual: value::type_name(value).to_owned(),
        }
    }
}

impl PropertyBehavior for BoolCast {
    fn properties(&self) -> Vec<&str> {
        self.properties.iter().map(String::as_str).collect()
    }

    fn retrieve_property(&self, value: Value, key: &str) -> Result<Value> {
        if value::is_null(&value) {
            return Ok(value);
        }
        match &value {
            Value::String(Some(s)) if s == "y" => Ok(Value::from(true)),
            Value::String(Some(s)) if s == "n" => Ok(Value::from(false)),
            Value::Bool(Some(_)) => Ok(value),
            _ => Err(Self::mismatch(key, "'y' or 'n'", &value)),
        }
    }

    fn persist_property(&self, value: Value, key: &str) -> Result<Value> {
        if value::is_null(&value) {
            return Ok(value);
        }
        match &value {
            Value::Bool(Some(true)) => Ok(Value::from("y")),
            Value::Bool(Some(false)) => Ok(Value::from("n")),
            Value::String(Some(s)) if s == "y" || s == "n" => Ok(value),
            _ => Err(Self::mismatch(key, "bool", &value)),
        }
    }
}

impl Behavior for BoolCast {
    fn name(&self) -> &'static str {
        "bool_cast"
    }

    fn as_property(&self) -> Option<&dyn PropertyBehavior> {
        Some(self)
    }
}
