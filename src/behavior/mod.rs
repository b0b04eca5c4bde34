//! Behaviors: pluggable hooks attached to a model
//!
//! A behavior exposes any subset of three capabilities:
//!
//! - [`PropertyBehavior`]: transform property values after retrieval and
//!   before persistence
//! - [`RewriteBehavior`]: rewrite filter conditions, column expressions and
//!   column paths while a query is assembled
//! - [`QueryAware`]: inspect the query once when attached, before any row is
//!   processed (for example to switch itself off for a dialect)
//!
//! [`Behaviors`] runs them in registration order. For property transforms the
//! output of one behavior is the input of the next.

mod binary;
mod bool_cast;
mod sensitive;
mod timestamp;
mod virtual_columns;

pub use binary::Binary;
pub use bool_cast::BoolCast;
pub use sensitive::Sensitive;
pub use timestamp::MillisecondTimestamp;
pub use virtual_columns::VirtualColumns;

use crate::config::Dialect;
use crate::error::Result;
use crate::filter::{Condition, Filter};
use crate::model::ModelRef;
use crate::record::Record;
use crate::relation::qualified_col;
use sea_query::{Expr, Value};
use std::fmt;

/// What a [`QueryAware`] behavior learns about the query it is attached to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryContext {
    pub dialect: Dialect,
    /// Table of the query's base model
    pub base_table: String,
}

/// Location of a condition or column being rewritten
#[derive(Debug, Clone, Copy)]
pub struct RewriteContext<'a> {
    /// Relation path of the model owning the column (`office.employee`)
    pub relation_path: &'a str,
    /// SQL alias of that model's table
    pub table_alias: &'a str,
    pub dialect: Dialect,
}

impl RewriteContext<'_> {
    /// Alias-qualified reference to a column of the model
    pub fn column(&self, column: &str) -> Expr {
        qualified_col(self.table_alias, column)
    }

    /// Absolute path of a column of the model, for building replacement filters
    pub fn path(&self, column: &str) -> String {
        format!("{}.{}", self.relation_path, column)
    }
}

/// Value transforms applied per property key
pub trait PropertyBehavior {
    /// Property keys this behavior transforms
    fn properties(&self) -> Vec<&str>;

    /// Database value -> application value
    fn retrieve_property(&self, value: Value, key: &str) -> Result<Value>;

    /// Application value -> database value
    fn persist_property(&self, value: Value, key: &str) -> Result<Value>;

    fn handles(&self, key: &str) -> bool {
        self.properties().contains(&key)
    }
}

/// Query-time rewrites
pub trait RewriteBehavior {
    /// Replace a leaf condition with another filter
    ///
    /// `condition.column` is the bare column name on the owning model. The
    /// replacement is resolved again from the query's base model, so paths in
    /// it must be absolute (see [`RewriteContext::path`]).
    fn rewrite_condition(&self, _condition: &Condition, _context: &RewriteContext<'_>) -> Result<Option<Filter>> {
        Ok(None)
    }

    /// Replace the SQL expression standing for a column
    fn rewrite_column(&self, _column: &str, _context: &RewriteContext<'_>) -> Option<Expr> {
        None
    }

    /// Map a column name to another path relative to the owning model
    fn rewrite_path(&self, _column: &str) -> Option<String> {
        None
    }
}

/// Behaviors that inspect the query before use
pub trait QueryAware {
    fn set_query(&mut self, context: &QueryContext);
}

/// A pluggable hook; capabilities are discovered through the `as_*` methods
pub trait Behavior: Send + Sync {
    fn name(&self) -> &'static str;

    fn as_property(&self) -> Option<&dyn PropertyBehavior> {
        None
    }

    fn as_rewrite(&self) -> Option<&dyn RewriteBehavior> {
        None
    }

    fn as_query_aware(&mut self) -> Option<&mut dyn QueryAware> {
        None
    }
}

/// Ordered behavior pipeline of one model
#[derive(Default)]
pub struct Behaviors {
    behaviors: Vec<Box<dyn Behavior>>,
}

impl fmt::Debug for Behaviors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.behaviors.iter().map(|behavior| behavior.name()))
            .finish()
    }
}

impl Behaviors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the pipeline of `model` by running its behavior builder
    pub fn for_model(model: &ModelRef) -> Self {
        let mut behaviors = Behaviors::new();
        model.create_behaviors(&mut behaviors);
        behaviors
    }

    /// Append a behavior
    pub fn add<B: Behavior + 'static>(&mut self, behavior: B) -> &mut Self {
        self.behaviors.push(Box::new(behavior));
        self
    }

    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }

    /// Hand the query context to every query-aware behavior
    pub fn set_query(&mut self, context: &QueryContext) {
        for behavior in self.behaviors.iter_mut() {
            if let Some(aware) = behavior.as_query_aware() {
                aware.set_query(context);
            }
        }
    }

    fn property_behaviors<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a dyn PropertyBehavior> + 'a {
        self.behaviors
            .iter()
            .filter_map(|behavior| behavior.as_property())
            .filter(move |behavior| behavior.handles(key))
    }

    fn rewrite_behaviors(&self) -> impl Iterator<Item = &dyn RewriteBehavior> {
        self.behaviors.iter().filter_map(|behavior| behavior.as_rewrite())
    }

    /// Run `value` through every property behavior handling `key`
    pub fn retrieve_property(&self, value: Value, key: &str) -> Result<Value> {
        self.property_behaviors(key)
            .try_fold(value, |value, behavior| behavior.retrieve_property(value, key))
    }

    /// Run `value` through every property behavior handling `key`
    pub fn persist_property(&self, value: Value, key: &str) -> Result<Value> {
        self.property_behaviors(key)
            .try_fold(value, |value, behavior| behavior.persist_property(value, key))
    }

    /// Apply the retrieval transforms to every property present on the record
    pub fn retrieve(&self, record: &mut Record) -> Result<()> {
        self.transform(record, Self::retrieve_property)
    }

    /// Apply the persistence transforms to every property present on the record
    pub fn persist(&self, record: &mut Record) -> Result<()> {
        self.transform(record, Self::persist_property)
    }

    fn transform(&self, record: &mut Record, step: fn(&Self, Value, &str) -> Result<Value>) -> Result<()> {
        let keys: Vec<String> = record.keys().map(str::to_owned).collect();
        for key in keys {
            if let Some(slot) = record.property_mut(&key) {
                let value = std::mem::replace(slot, crate::value::null());
                *slot = step(self, value, &key)?;
            }
        }
        Ok(())
    }

    /// First replacement offered by a rewrite behavior
    pub fn rewrite_condition(&self, condition: &Condition, context: &RewriteContext<'_>) -> Result<Option<Filter>> {
        for behavior in self.rewrite_behaviors() {
            if let Some(replacement) = behavior.rewrite_condition(condition, context)? {
                return Ok(Some(replacement));
            }
        }
        Ok(None)
    }

    /// First column expression offered by a rewrite behavior
    pub fn rewrite_column(&self, column: &str, context: &RewriteContext<'_>) -> Option<Expr> {
        self.rewrite_behaviors()
            .find_map(|behavior| behavior.rewrite_column(column, context))
    }

    /// First path offered by a rewrite behavior
    pub fn rewrite_path(&self, column: &str) -> Option<String> {
        self.rewrite_behaviors()
            .find_map(|behavior| behavior.rewrite_path(column))
    }
}
