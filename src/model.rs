//! Model descriptors.
//!
//! A [`Model`] describes one table: its name, key column(s), queryable columns
//! and the relations and behaviors attached to it. Descriptors are immutable;
//! queries wrap each instance they use in a [`ModelRef`] carrying an opaque
//! [`ModelId`] so that two instances of the same model (a self relation, for
//! example) are told apart by the resolver caches.

use crate::behavior::Behaviors;
use crate::error::Result;
use crate::record::Record;
use crate::relation::{Identity, Relations};
use indexmap::IndexMap;
use sea_query::Value;
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Queryable columns of a model, keyed by the property/alias name
pub type Columns = IndexMap<String, ColumnExpr>;

/// Computed property of a record
pub type Accessor = fn(&Record) -> Option<Value>;

/// Expression behind a model column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnExpr {
    /// A real column of the table
    Column(String),
    /// A derived SQL expression; `{table}` is replaced by the table alias
    Raw(String),
}

impl ColumnExpr {
    /// Create a raw expression column
    pub fn raw(sql: impl Into<String>) -> Self {
        ColumnExpr::Raw(sql.into())
    }
}

impl From<&str> for ColumnExpr {
    fn from(name: &str) -> Self {
        ColumnExpr::Column(name.to_owned())
    }
}

impl From<String> for ColumnExpr {
    fn from(name: String) -> Self {
        ColumnExpr::Column(name)
    }
}

/// Build a [`Columns`] map of plain columns whose alias equals the column name
pub fn column_list<I, S>(names: I) -> Columns
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names
        .into_iter()
        .map(|name| {
            let name = name.into();
            (name.clone(), ColumnExpr::Column(name))
        })
        .collect()
}

/// Model descriptor
///
/// # Example
///
/// ```no_run
/// use undertow::{Model, Columns, column_list, Identity, Relations, Result};
///
/// struct Office;
/// struct Employee;
///
/// impl Model for Office {
///     fn table_name(&self) -> &str { "office" }
///     fn key_name(&self) -> Identity { "id".into() }
///     fn columns(&self) -> Columns { column_list(["city"]) }
///     fn create_relations(&self, relations: &mut Relations) -> Result<()> {
///         relations.has_many("employee", || Employee)?;
///         Ok(())
///     }
/// }
/// # impl Model for Employee {
/// #     fn table_name(&self) -> &str { "employee" }
/// #     fn key_name(&self) -> Identity { "id".into() }
/// #     fn columns(&self) -> Columns { column_list(["name", "office_id"]) }
/// # }
/// ```
pub trait Model: Send + Sync + 'static {
    /// Name of the table
    fn table_name(&self) -> &str;

    /// Primary key column(s)
    fn key_name(&self) -> Identity;

    /// Queryable columns (may contain derived expressions)
    fn columns(&self) -> Columns;

    /// Register the relations of this model
    fn create_relations(&self, _relations: &mut Relations) -> Result<()> {
        Ok(())
    }

    /// Register the behaviors of this model
    fn create_behaviors(&self, _behaviors: &mut Behaviors) {}

    /// Values for properties a result row does not provide
    fn defaults(&self) -> IndexMap<String, Value> {
        IndexMap::new()
    }

    /// Computed properties available on hydrated records
    fn accessors(&self) -> Vec<(&'static str, Accessor)> {
        Vec::new()
    }
}

/// Opaque per-instance handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(u64);

static NEXT_MODEL_ID: AtomicU64 = AtomicU64::new(1);

impl ModelId {
    fn next() -> Self {
        ModelId(NEXT_MODEL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A model instance with its identity handle
#[derive(Clone)]
pub struct ModelRef {
    id: ModelId,
    model: Arc<dyn Model>,
}

impl ModelRef {
    /// Wrap a new model instance, assigning a fresh handle
    pub fn new<M: Model>(model: M) -> Self {
        Self {
            id: ModelId::next(),
            model: Arc::new(model),
        }
    }

    /// Identity handle of this instance
    pub fn id(&self) -> ModelId {
        self.id
    }

    /// Whether `other` is the very same instance
    pub fn same_instance(&self, other: &ModelRef) -> bool {
        self.id == other.id
    }
}

impl Deref for ModelRef {
    type Target = dyn Model;

    fn deref(&self) -> &Self::Target {
        self.model.as_ref()
    }
}

impl fmt::Debug for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRef")
            .field("id", &self.id)
            .field("table", &self.model.table_name())
            .finish()
    }
}

/// Factory producing fresh model instances, used for relation targets
pub type ModelFactory = Arc<dyn Fn() -> ModelRef + Send + Sync>;

/// Wrap a closure returning a model into a [`ModelFactory`]
pub fn factory<M, F>(create: F) -> ModelFactory
where
    M: Model,
    F: Fn() -> M + Send + Sync + 'static,
{
    Arc::new(move || ModelRef::new(create()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests_cfg::Office;

    #[test]
    fn test_instances_get_distinct_handles() {
        let a = ModelRef::new(Office);
        let b = ModelRef::new(Office);
        assert_ne!(a.id(), b.id());
        assert!(a.same_instance(&a.clone()));
        assert!(!a.same_instance(&b));
        assert_eq!(a.table_name(), b.table_name());
    }

    #[test]
    fn test_column_list_keeps_order() {
        let columns = column_list(["name", "city", "country"]);
        let names: Vec<&str> = columns.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["name", "city", "country"]);
        assert_eq!(columns["city"], ColumnExpr::Column("city".into()));
    }

    #[test]
    fn test_factory_creates_fresh_instances() {
        let create = factory(|| Office);
        assert_ne!(create().id(), create().id());
    }
}
