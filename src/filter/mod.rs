//! Filter trees
//!
//! A [`Filter`] is an immutable tree of combinators (`All`, `Any`, `NoneOf`)
//! over leaf [`Condition`]s whose column is a dotted path relative to the
//! query's base model. [`FilterProcessor`] resolves such a tree against the
//! relation graph and produces a sea-query `Condition` plus the joins it needs.

pub mod processor;
pub use processor::{FilterProcessor, ProcessedFilter};

use sea_query::{Expr, Value};

/// Comparison operator of a leaf condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equal,
    Unequal,
    Like,
    Unlike,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl Operator {
    /// Negations are answered with "no related row matches" on to-many paths
    pub fn is_negative(&self) -> bool {
        matches!(self, Operator::Unequal | Operator::Unlike)
    }

    /// Positive counterpart of a negation
    pub fn positive(&self) -> Operator {
        match self {
            Operator::Unequal => Operator::Equal,
            Operator::Unlike => Operator::Like,
            other => *other,
        }
    }
}

/// Right-hand side of a leaf condition
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Null,
    Scalar(Value),
    List(Vec<Value>),
}

impl FilterValue {
    pub fn is_null(&self) -> bool {
        match self {
            FilterValue::Null => true,
            FilterValue::Scalar(value) => crate::value::is_null(value),
            FilterValue::List(_) => false,
        }
    }
}

macro_rules! impl_scalar_filter_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for FilterValue {
                fn from(value: $ty) -> Self {
                    FilterValue::Scalar(Value::from(value))
                }
            }
        )*
    };
}

impl_scalar_filter_value!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u16,
    u32,
    u64,
    f32,
    f64,
    char,
    &str,
    String,
    chrono::DateTime<chrono::Utc>,
);

impl From<Value> for FilterValue {
    fn from(value: Value) -> Self {
        FilterValue::Scalar(value)
    }
}

impl<V: Into<Value>> From<Vec<V>> for FilterValue {
    fn from(values: Vec<V>) -> Self {
        FilterValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl<V: Into<Value>, const N: usize> From<[V; N]> for FilterValue {
    fn from(values: [V; N]) -> Self {
        FilterValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl<V: Into<FilterValue>> From<Option<V>> for FilterValue {
    fn from(value: Option<V>) -> Self {
        value.map_or(FilterValue::Null, Into::into)
    }
}

/// Leaf comparison: `column operator value`
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Dotted path (`employee.department.name`) or bare column
    pub column: String,
    pub operator: Operator,
    pub value: FilterValue,
}

impl Condition {
    pub fn new(column: impl Into<String>, operator: Operator, value: impl Into<FilterValue>) -> Self {
        Self {
            column: column.into(),
            operator,
            value: value.into(),
        }
    }

    /// Same condition on another column
    pub fn with_column(&self, column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ..self.clone()
        }
    }
}

/// Filter tree
#[derive(Debug, Clone)]
pub enum Filter {
    /// Every child holds (AND)
    All(Vec<Filter>),
    /// At least one child holds (OR)
    Any(Vec<Filter>),
    /// No child holds
    NoneOf(Vec<Filter>),
    Condition(Condition),
    /// Pre-built SQL expression, used as is
    Expression(Expr),
}

impl Filter {
    pub fn all(children: impl IntoIterator<Item = Filter>) -> Self {
        Filter::All(children.into_iter().collect())
    }

    pub fn any(children: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Any(children.into_iter().collect())
    }

    pub fn none_of(children: impl IntoIterator<Item = Filter>) -> Self {
        Filter::NoneOf(children.into_iter().collect())
    }

    pub fn condition(column: impl Into<String>, operator: Operator, value: impl Into<FilterValue>) -> Self {
        Filter::Condition(Condition::new(column, operator, value))
    }

    pub fn equal(column: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::condition(column, Operator::Equal, value)
    }

    pub fn unequal(column: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::condition(column, Operator::Unequal, value)
    }

    /// `*` in the pattern matches any sequence of characters
    pub fn like(column: impl Into<String>, pattern: impl Into<FilterValue>) -> Self {
        Self::condition(column, Operator::Like, pattern)
    }

    pub fn unlike(column: impl Into<String>, pattern: impl Into<FilterValue>) -> Self {
        Self::condition(column, Operator::Unlike, pattern)
    }

    pub fn greater_than(column: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::condition(column, Operator::GreaterThan, value)
    }

    pub fn greater_than_or_equal(column: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::condition(column, Operator::GreaterThanOrEqual, value)
    }

    pub fn less_than(column: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::condition(column, Operator::LessThan, value)
    }

    pub fn less_than_or_equal(column: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::condition(column, Operator::LessThanOrEqual, value)
    }

    pub fn expression(expr: Expr) -> Self {
        Filter::Expression(expr)
    }

    /// Combine with another filter under AND, flattening nested `All`s
    pub fn and(self, other: Filter) -> Self {
        match self {
            Filter::All(mut children) => {
                children.push(other);
                Filter::All(children)
            }
            this => Filter::All(vec![this, other]),
        }
    }

    /// Every leaf column path in the tree, depth first
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Filter::All(children) | Filter::Any(children) | Filter::NoneOf(children) => {
                children.iter().flat_map(Filter::columns).collect()
            }
            Filter::Condition(condition) => vec![condition.column.as_str()],
            Filter::Expression(_) => Vec::new(),
        }
    }
}

impl From<Condition> for Filter {
    fn from(condition: Condition) -> Self {
        Filter::Condition(condition)
    }
}
