//! Query assembly.
//!
//! This module turns model descriptors into aliased SQL `SELECT` statements:
//!
//! - **Resolver**: walks dotted column and relation paths through the relation graph
//! - **Join**: join specifications and the per-statement join registry
//! - **Select**: the [`Query`] builder and statement assembly
//! - **Union**: [`UnionQuery`] over a `UNION ALL` of several models
//! - **Column**: entries of an explicit projection
//!
//! # Examples
//!
//! ```no_run
//! use undertow::{Filter, Query};
//! use sea_query::Order;
//! # use undertow::{column_list, Columns, Identity, Model};
//! # struct Office;
//! # impl Model for Office {
//! #     fn table_name(&self) -> &str { "office" }
//! #     fn key_name(&self) -> Identity { "id".into() }
//! #     fn columns(&self) -> Columns { column_list(["city"]) }
//! # }
//!
//! let mut query = Query::new(Office)
//!     .columns(["id", "city"])
//!     .filter(Filter::like("city", "Duck*"))
//!     .order_by("city", Order::Asc);
//! let (sql, values) = query.build()?;
//! # Ok::<(), undertow::OrmError>(())
//! ```

// Path resolution
pub mod resolver;
#[doc(inline)]
pub use resolver::{RelationStep, ResolvedColumn, Resolver};

// Joins
pub mod join;
#[doc(inline)]
pub use join::{JoinKind, JoinPurpose, JoinRegistry, JoinSpec, RequiredJoin};

// Projection entries
pub mod column;
#[doc(inline)]
pub use column::SelectColumn;

// SELECT builder
pub mod select;
#[doc(inline)]
pub use select::Query;

// UNION ALL queries
pub mod union;
#[doc(inline)]
pub use union::{UnionMember, UnionModel, UnionQuery};
