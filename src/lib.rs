//! # Undertow
//!
//! Relation resolution and query assembly on top of `sea-query`.
//!
//! Models describe a table, its key, its columns and its named relations.
//! A [`Query`] resolves dotted paths (`employee.department.name`) through that
//! relation graph into aliased joins, translates [`Filter`] trees into SQL
//! conditions with the same joins, runs model [`Behaviors`] over conditions
//! and values, and hydrates flat result rows into nested [`Record`]s.
//!
//! Executing statements is left to the caller: [`Query::build`] returns SQL
//! and bound values, [`Query::result_set`] hydrates the rows fetched for them.

pub mod behavior;
pub mod config;
pub mod error;
pub mod filter;
pub mod hydrator;
#[cfg(any(feature = "metrics", feature = "tracing"))]
pub mod metrics;
pub mod model;
pub mod query;
pub mod record;
pub mod relation;
pub mod result_set;
pub mod value;

#[cfg(test)]
mod tests_cfg;

pub use behavior::{Behavior, Behaviors};
pub use config::{Dialect, QueryConfig};
pub use error::{ErrorKind, OrmError, Result};
pub use filter::{Filter, FilterValue, Operator};
pub use hydrator::{Hydrator, Row};
pub use model::{column_list, factory, Accessor, ColumnExpr, Columns, Model, ModelFactory, ModelId, ModelRef};
pub use query::{JoinKind, Query, SelectColumn, UnionMember, UnionModel, UnionQuery};
pub use record::Record;
pub use relation::{Identity, Relation, RelationKind, Relations};
pub use result_set::ResultSet;
