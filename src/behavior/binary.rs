use crate::behavior::{Behavior, PropertyBehavior, QueryAware, QueryContext, RewriteBehavior, RewriteContext};
use crate::config::Dialect;
use crate::error::{OrmError, Result};
use crate::filter::{Condition, Filter, FilterValue, Operator};
use crate::value;
use sea_query::{Alias, Expr, ExprTrait, Func, Value};

/// Binary columns exchanged as PostgreSQL `\x` hex text
///
/// Switches itself off when attached to a query for another dialect. While
/// active, `like`/`unlike` conditions on its columns match against the hex
/// encoding of the stored bytes.
#[derive(Debug, Clone)]
pub struct Binary {
    properties: Vec<String>,
    active: bool,
}

impl Binary {
    pub fn new<I, S>(properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            properties: properties.into_iter().map(Into::into).collect(),
            active: true,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    fn mismatch(key: &str, expected: &'static str, value: &Value) -> OrmError {
        OrmError::TypeMismatch {
            behavior: "Binary",
            key: key.to_owned(),
            expected,
            actual: value::type_name(value).to_owned(),
        }
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{:02x}", byte)).collect()
}

fn decode_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| hex.get(i..i + 2).and_then(|pair| u8::from_str_radix(pair, 16).ok()))
        .collect()
}

impl PropertyBehavior for Binary {
    fn properties(&self) -> Vec<&str> {
        self.properties.iter().map(String::as_str).collect()
    }

    fn retrieve_property(&self, value: Value, key: &str) -> Result<Value> {
        if value::is_null(&value) {
            return Ok(value);
        }
        match &value {
            Value::String(Some(s)) => s
                .strip_prefix("\\x")
                .and_then(decode_hex)
                .map(Value::from)
                .ok_or_else(|| Self::mismatch(key, "'\\x' hex text", &value)),
            Value::Bytes(Some(_)) => Ok(value),
            _ => Err(Self::mismatch(key, "'\\x' hex text", &value)),
        }
    }

    fn persist_property(&self, value: Value, key: &str) -> Result<Value> {
        if value::is_null(&value) {
            return Ok(value);
        }
        match &value {
            Value::Bytes(Some(bytes)) => Ok(Value::from(format!("\\x{}", encode_hex(bytes)))),
            Value::String(Some(_)) => Ok(value),
            _ => Err(Self::mismatch(key, "bytes", &value)),
        }
    }
}

impl RewriteBehavior for Binary {
    fn rewrite_condition(&self, condition: &Condition, context: &RewriteContext<'_>) -> Result<Option<Filter>> {
        if !self.properties.iter().any(|p| *p == condition.column) {
            return Ok(None);
        }
        let pattern = match (&condition.operator, &condition.value) {
            (Operator::Like | Operator::Unlike, FilterValue::Scalar(Value::String(Some(s)))) => {
                s.replace('*', "%").to_lowercase()
            }
            (Operator::Like | Operator::Unlike, FilterValue::Scalar(Value::Bytes(Some(b)))) => {
                format!("%{}%", encode_hex(b))
            }
            _ => return Ok(None),
        };

        let encoded = Expr::from(
            Func::cust(Alias::new("ENCODE"))
                .arg(context.column(&condition.column))
                .arg("hex"),
        );
        let expr = if condition.operator == Operator::Like {
            encoded.like(pattern)
        } else {
            encoded.not_like(pattern)
        };
        Ok(Some(Filter::Expression(expr)))
    }
}

impl QueryAware for Binary {
    fn set_query(&mut self, context: &QueryContext) {
        self.active = context.dialect == Dialect::Postgres;
        if !self.active {
            log::trace!("binary behavior disabled for {:?} query on {}", context.dialect, context.base_table);
        }
    }
}

impl Behavior for Binary {
    fn name(&self) -> &'static str {
        "binary"
    }

    fn as_property(&self) -> Option<&dyn PropertyBehavior> {
        self.active.then_some(self as &dyn PropertyBehavior)
    }

    fn as_rewrite(&self) -> Option<&dyn RewriteBehavior> {
        self.active.then_some(self as &dyn RewriteBehavior)
    }

    fn as_query_aware(&mut self) -> Option<&mut dyn QueryAware> {
        Some(self)
    }
}
