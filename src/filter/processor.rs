//! Filter resolution
//!
//! [`FilterProcessor`] turns a [`Filter`] tree into a sea-query condition.
//! Each leaf column is resolved through the query's [`Resolver`]; the
//! relation paths it traverses are collected as the joins the condition
//! needs, returned next to the condition instead of being written into the
//! query.
//!
//! Conditions on a to-many path that is joined only for filtering never join
//! in the outer statement, where the related rows would multiply the base
//! rows. They become `IN` subqueries over the base key, and negations become
//! `NOT IN`: "no related row matches" rather than "some related row differs".

use crate::error::{OrmError, Result};
use crate::filter::{Condition, Filter, FilterValue, Operator};
use crate::query::{JoinKind, Resolver, ResolvedColumn};
use crate::value;
use indexmap::{IndexMap, IndexSet};
use sea_query::{Condition as Cond, Expr, ExprTrait, SelectStatement, Value};
use std::collections::HashSet;

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;

/// Output of [`FilterProcessor::process`]
#[derive(Debug, Clone)]
pub struct ProcessedFilter {
    pub condition: Cond,
    /// Absolute relation paths the condition needs joined, parents first
    pub required_joins: Vec<String>,
}

pub struct FilterProcessor<'a> {
    resolver: &'a mut Resolver,
    /// Relation paths the query joins for other reasons than filtering
    declared: &'a HashSet<String>,
    /// `SELECT ... FROM <base>` template for to-many subqueries
    source: &'a SelectStatement,
    /// Inside a subquery: every path is inner joined there
    nested: bool,
    required: IndexSet<String>,
    rewriting: HashSet<String>,
}

impl<'a> FilterProcessor<'a> {
    pub fn new(resolver: &'a mut Resolver, declared: &'a HashSet<String>, source: &'a SelectStatement) -> Self {
        Self {
            resolver,
            declared,
            source,
            nested: false,
            required: IndexSet::new(),
            rewriting: HashSet::new(),
        }
    }

    /// Resolve `filter` into a condition and the joins it needs
    pub fn process(mut self, filter: &Filter) -> Result<ProcessedFilter> {
        let condition = self.node(filter)?;
        Ok(ProcessedFilter {
            condition,
            required_joins: self.required.into_iter().collect(),
        })
    }

    fn node(&mut self, filter: &Filter) -> Result<Cond> {
        match filter {
            Filter::All(children) => self.all(children),
            Filter::Any(children) if children.is_empty() => Ok(Cond::all().add(Expr::cust("1 = 0"))),
            Filter::Any(children) => children
                .iter()
                .try_fold(Cond::any(), |any, child| Ok(any.add(self.node(child)?))),
            Filter::NoneOf(children) => self.none_of(children),
            Filter::Condition(condition) => self.leaf(condition),
            Filter::Expression(expr) => Ok(Cond::all().add(expr.clone())),
        }
    }

    /// First to-many relation the column crosses that is joined only for filtering
    fn filter_only_to_many(&self, resolved: &ResolvedColumn) -> Option<String> {
        if self.nested {
            return None;
        }
        resolved
            .steps
            .iter()
            .find(|path| {
                !self.declared.contains(*path)
                    && self
                        .resolver
                        .step_at(path)
                        .is_some_and(|step| step.is_to_many())
            })
            .cloned()
    }

    /// Filter-only to-many path shared by every leaf of `filter`
    ///
    /// Only positive leaves combined with `all`/`any` qualify: such a subtree
    /// can be answered by one subquery over the related rows.
    fn to_many_group(&mut self, filter: &Filter) -> Result<Option<String>> {
        match filter {
            Filter::Condition(condition) if !condition.operator.is_negative() => {
                let resolved = self.resolver.resolve_column(&condition.column)?;
                Ok(self.filter_only_to_many(&resolved))
            }
            Filter::All(children) | Filter::Any(children) => {
                let mut group: Option<String> = None;
                for child in children {
                    match self.to_many_group(child)? {
                        Some(path) if group.as_ref().map_or(true, |current| *current == path) => {
                            group = Some(path)
                        }
                        _ => return Ok(None),
                    }
                }
                Ok(group)
            }
            _ => Ok(None),
        }
    }

    fn require(&mut self, resolved: &ResolvedColumn) {
        for path in &resolved.steps {
            self.required.insert(path.clone());
        }
    }

    /// `ALL (children)`: children on the same filter-only to-many path share
    /// one `IN` test, so they must hold on the same related row
    fn all(&mut self, children: &[Filter]) -> Result<Cond> {
        let mut groups: IndexMap<String, Vec<Filter>> = IndexMap::new();
        let mut keys = Vec::with_capacity(children.len());
        for child in children {
            let group = self.to_many_group(child)?;
            if let Some(path) = &group {
                groups.entry(path.clone()).or_default().push(child.clone());
            }
            keys.push(group);
        }

        let mut condition = Cond::all();
        for (child, group) in children.iter().zip(keys) {
            match group {
                None => condition = condition.add(self.node(child)?),
                Some(path) => {
                    if let Some(members) = groups.shift_remove(&path) {
                        condition = condition.add(self.subquery(&combine(members, Filter::All), false)?);
                    }
                }
            }
        }
        Ok(condition)
    }

    fn leaf(&mut self, condition: &Condition) -> Result<Cond> {
        let resolved = self.resolver.resolve_column(&condition.column)?;

        if self.filter_only_to_many(&resolved).is_some() {
            return if condition.operator.is_negative() {
                let positive = Filter::Condition(Condition {
                    column: condition.column.clone(),
                    operator: condition.operator.positive(),
                    value: condition.value.clone(),
                });
                self.subquery(&positive, true)
            } else {
                self.subquery(&Filter::Condition(condition.clone()), false)
            };
        }

        self.require(&resolved);
        let behaviors = self.resolver.behaviors(&resolved.model);

        let full_path = resolved.path();
        if !self.rewriting.contains(&full_path) {
            let bare = condition.with_column(resolved.column.clone());
            let context = resolved.rewrite_context(self.resolver.dialect());
            if let Some(replacement) = behaviors.rewrite_condition(&bare, &context)? {
                log::trace!("condition on {} rewritten by behavior", full_path);
                self.rewriting.insert(full_path.clone());
                let result = self.node(&replacement);
                self.rewriting.remove(&full_path);
                return result;
            }
        }

        let column = self.resolver.qualify(&resolved);
        let value = persist(&behaviors, &resolved.column, &condition.value)?;
        translate(column, condition.operator, value, &resolved.column)
    }

    /// `NONE OF (children)`: children on one filter-only to-many path share a
    /// `NOT IN` test; the others are negated as a whole
    fn none_of(&mut self, children: &[Filter]) -> Result<Cond> {
        let mut groups: IndexMap<String, Vec<Filter>> = IndexMap::new();
        let mut rest = Vec::new();
        for child in children {
            match self.to_many_group(child)? {
                Some(path) => groups.entry(path).or_default().push(child.clone()),
                None => rest.push(child),
            }
        }

        let mut condition = Cond::all();
        for (_, members) in groups {
            condition = condition.add(self.subquery(&combine(members, Filter::Any), true)?);
        }
        if !rest.is_empty() {
            let any = rest
                .into_iter()
                .try_fold(Cond::any(), |any, child| Ok::<_, OrmError>(any.add(self.node(child)?)))?;
            condition = condition.add(any.not());
        }
        Ok(condition)
    }

    /// `base.key [NOT] IN (SELECT base.key FROM base INNER JOIN ... WHERE filter)`
    fn subquery(&mut self, filter: &Filter, negated: bool) -> Result<Cond> {
        let processed = FilterProcessor {
            resolver: &mut *self.resolver,
            declared: self.declared,
            source: self.source,
            nested: true,
            required: IndexSet::new(),
            rewriting: self.rewriting.clone(),
        }
        .process(filter)?;

        let keys = self.resolver.base_key_exprs();
        let mut subquery = self.source.clone();
        for key in &keys {
            subquery.expr(key.clone());
        }
        for path in &processed.required_joins {
            if let Some(step) = self.resolver.step_at(path) {
                for join in &step.joins {
                    join.apply(&mut subquery, JoinKind::Inner);
                }
            }
        }
        if !processed.condition.is_empty() {
            subquery.cond_where(processed.condition);
        }

        #[cfg(feature = "metrics")]
        METRICS.record_filter_subquery(negated);
        log::trace!("to-many condition answered with subquery (negated: {})", negated);

        let key = match keys.as_slice() {
            [single] => single.clone(),
            _ => Expr::tuple(keys),
        };
        let test = if negated {
            key.not_in_subquery(subquery)
        } else {
            key.in_subquery(subquery)
        };
        Ok(Cond::all().add(test))
    }
}

fn combine(mut members: Vec<Filter>, wrap: fn(Vec<Filter>) -> Filter) -> Filter {
    if members.len() == 1 {
        members.remove(0)
    } else {
        wrap(members)
    }
}

/// Run filter values through the owning model's persistence transforms
fn persist(behaviors: &crate::behavior::Behaviors, column: &str, value: &FilterValue) -> Result<FilterValue> {
    Ok(match value {
        FilterValue::Null => FilterValue::Null,
        FilterValue::Scalar(v) => FilterValue::Scalar(behaviors.persist_property(v.clone(), column)?),
        FilterValue::List(values) => FilterValue::List(
            values
                .iter()
                .map(|v| behaviors.persist_property(v.clone(), column))
                .collect::<Result<_>>()?,
        ),
    })
}

/// `*` wildcards become `%`; `None` when the pattern has no wildcard
fn like_pattern(value: &Value) -> Option<String> {
    match value {
        Value::String(Some(s)) if s.contains('*') => Some(s.replace('*', "%")),
        _ => None,
    }
}

fn scalar_or_mismatch(filter_value: FilterValue, key: &str) -> Result<Value> {
    match filter_value {
        FilterValue::Scalar(v) if !value::is_null(&v) => Ok(v),
        FilterValue::List(_) => Err(OrmError::TypeMismatch {
            behavior: "FilterProcessor",
            key: key.to_owned(),
            expected: "scalar",
            actual: "list".to_owned(),
        }),
        _ => Err(OrmError::TypeMismatch {
            behavior: "FilterProcessor",
            key: key.to_owned(),
            expected: "scalar",
            actual: "null".to_owned(),
        }),
    }
}

/// Translate one comparison
///
/// Negations admit `NULL` so that a missing value counts as "not equal".
fn translate(column: Expr, operator: Operator, value: FilterValue, key: &str) -> Result<Cond> {
    let is_null = value.is_null();
    let expr_or_null = |expr: Expr| Cond::any().add(expr).add(column.clone().is_null());

    let condition = match operator {
        Operator::Equal if is_null => Cond::all().add(column.is_null()),
        Operator::Unequal if is_null => Cond::all().add(column.is_not_null()),
        Operator::Like if is_null => Cond::all().add(column.is_null()),
        Operator::Unlike if is_null => Cond::all().add(column.is_not_null()),
        Operator::Equal => match value {
            FilterValue::List(values) => Cond::all().add(column.is_in(values)),
            FilterValue::Scalar(v) => Cond::all().add(column.eq(v)),
            FilterValue::Null => Cond::all().add(column.is_null()),
        },
        Operator::Unequal => match value {
            FilterValue::List(values) => expr_or_null(column.clone().is_not_in(values)),
            FilterValue::Scalar(v) => expr_or_null(column.clone().ne(v)),
            FilterValue::Null => Cond::all().add(column.is_not_null()),
        },
        Operator::Like => match value {
            FilterValue::List(values) => values.iter().fold(Cond::any(), |any, v| {
                any.add(like_or_eq(column.clone(), v))
            }),
            FilterValue::Scalar(v) => Cond::all().add(like_or_eq(column, &v)),
            FilterValue::Null => Cond::all().add(column.is_null()),
        },
        Operator::Unlike => match value {
            FilterValue::List(values) => values
                .iter()
                .fold(Cond::all(), |all, v| all.add(expr_or_null(unlike_or_ne(column.clone(), v)))),
            FilterValue::Scalar(v) => expr_or_null(unlike_or_ne(column.clone(), &v)),
            FilterValue::Null => Cond::all().add(column.is_not_null()),
        },
        Operator::GreaterThan => Cond::all().add(column.gt(scalar_or_mismatch(value, key)?)),
        Operator::GreaterThanOrEqual => Cond::all().add(column.gte(scalar_or_mismatch(value, key)?)),
        Operator::LessThan => Cond::all().add(column.lt(scalar_or_mismatch(value, key)?)),
        Operator::LessThanOrEqual => Cond::all().add(column.lte(scalar_or_mismatch(value, key)?)),
    };
    Ok(condition)
}

fn like_or_eq(column: Expr, value: &Value) -> Expr {
    match like_pattern(value) {
        Some(pattern) => column.like(pattern),
        None => column.eq(value.clone()),
    }
}

fn unlike_or_ne(column: Expr, value: &Value) -> Expr {
    match like_pattern(value) {
        Some(pattern) => column.not_like(pattern),
        None => column.ne(value.clone()),
    }
}
