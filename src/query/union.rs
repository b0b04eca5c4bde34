//! Queries over a `UNION ALL` of several models
//!
//! A union model is a virtual table: each member selects the outer model's
//! columns from its own model, the members are combined with `UNION ALL`, and
//! the result is joined, filtered and projected like a real table aliased to
//! the outer table name.

use crate::config::QueryConfig;
use crate::error::{OrmError, Result};
use crate::filter::Filter;
use crate::hydrator::{Hydrator, Row};
use crate::model::{factory, Model, ModelFactory};
use crate::query::column::SelectColumn;
use crate::query::select::{Query, Source};
use crate::result_set::ResultSet;
use crate::value;
use indexmap::IndexMap;
use sea_query::{Expr, Order, SelectStatement, Values};
use std::fmt;

/// A model backed by a union of other models
pub trait UnionModel: Model {
    /// Members of the union, in `UNION ALL` order
    fn unions(&self) -> Vec<UnionMember>;
}

/// One `SELECT` of a union
///
/// Outer columns the member does not map are selected as `NULL`.
#[derive(Clone)]
pub struct UnionMember {
    target: ModelFactory,
    /// Outer column -> member column
    columns: IndexMap<String, SelectColumn>,
    filter: Option<Filter>,
}

impl UnionMember {
    pub fn new<M, F>(target: F) -> Self
    where
        M: Model,
        F: Fn() -> M + Send + Sync + 'static,
    {
        Self {
            target: factory(target),
            columns: IndexMap::new(),
            filter: None,
        }
    }

    /// Provide the outer column `outer` from `column` of the member model
    pub fn column(mut self, outer: impl Into<String>, column: impl Into<SelectColumn>) -> Self {
        self.columns.insert(outer.into(), column.into());
        self
    }

    /// Restrict the rows this member contributes
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(current) => current.and(filter),
            None => filter,
        });
        self
    }

    /// Member SELECT projecting `outer_columns` in order
    pub(crate) fn select(&self, outer_columns: &[String], config: &QueryConfig) -> Result<SelectStatement> {
        let columns = outer_columns
            .iter()
            .map(|outer| match self.columns.get(outer) {
                Some(column) => column.realiased(outer).ok_or_else(|| {
                    OrmError::InvalidModel(format!("union column '{}' cannot select '*'", outer))
                }),
                None => Ok(SelectColumn::expression(outer.clone(), Expr::val(value::null()))),
            })
            .collect::<Result<Vec<_>>>()?;

        let mut query = Query::from_ref((self.target)())
            .with_config(config.clone())
            .columns(columns);
        if let Some(filter) = &self.filter {
            query = query.filter(filter.clone());
        }
        query.assemble()
    }
}

impl fmt::Debug for UnionMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnionMember")
            .field("columns", &self.columns)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

/// [`Query`] whose base table is the union of a [`UnionModel`]'s members
#[derive(Debug)]
pub struct UnionQuery {
    query: Query,
}

impl UnionQuery {
    pub fn new<M: UnionModel>(model: M) -> Self {
        let members = model.unions();
        Self {
            query: Query::new(model).with_source(Source::Union(members)),
        }
    }

    pub fn with_config(self, config: QueryConfig) -> Self {
        Self {
            query: self.query.with_config(config),
        }
    }

    pub fn columns<I, C>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<SelectColumn>,
    {
        Self {
            query: self.query.columns(columns),
        }
    }

    pub fn with(self, path: &str) -> Self {
        Self {
            query: self.query.with(path),
        }
    }

    pub fn with_optional(self, path: &str) -> Self {
        Self {
            query: self.query.with_optional(path),
        }
    }

    pub fn filter(self, filter: Filter) -> Self {
        Self {
            query: self.query.filter(filter),
        }
    }

    pub fn order_by(self, path: &str, order: Order) -> Self {
        Self {
            query: self.query.order_by(path, order),
        }
    }

    pub fn limit(self, limit: u64) -> Self {
        Self {
            query: self.query.limit(limit),
        }
    }

    pub fn offset(self, offset: u64) -> Self {
        Self {
            query: self.query.offset(offset),
        }
    }

    pub fn assemble(&mut self) -> Result<SelectStatement> {
        self.query.assemble()
    }

    pub fn assemble_count(&mut self) -> Result<SelectStatement> {
        self.query.assemble_count()
    }

    pub fn to_sql(&mut self) -> Result<String> {
        self.query.to_sql()
    }

    pub fn build(&mut self) -> Result<(String, Values)> {
        self.query.build()
    }

    pub fn create_hydrator(&mut self) -> Result<Hydrator> {
        self.query.create_hydrator()
    }

    pub fn result_set<R>(&mut self, rows: R) -> Result<ResultSet<R::IntoIter>>
    where
        R: IntoIterator<Item = Row>,
    {
        self.query.result_set(rows)
    }

    /// The wrapped query
    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn query_mut(&mut self) -> &mut Query {
        &mut self.query
    }

    pub fn into_query(self) -> Query {
        self.query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests_cfg::{Employee, Person};
    use pretty_assertions::assert_eq;
    use sea_query::PostgresQueryBuilder;

    #[test]
    fn test_union_is_wrapped_as_outer_table() {
        let mut query = UnionQuery::new(Person);
        let sql = query.assemble().unwrap().to_string(PostgresQueryBuilder);
        assert_eq!(
            sql,
            concat!(
                r#"SELECT "person"."id" AS "id", "person"."name" AS "name", "person"."kind" AS "kind", "person"."office_id" AS "office_id" "#,
                r#"FROM (SELECT "employee"."id" AS "id", "employee"."name" AS "name", 'employee' AS "kind", "employee"."office_id" AS "office_id" FROM "employee" "#,
                r#"UNION ALL (SELECT "user"."id" AS "id", "user"."name" AS "name", 'user' AS "kind", NULL AS "office_id" FROM "user")) AS "person""#
            )
        );
    }

    #[test]
    fn test_outer_filter_and_joins_use_derived_table() {
        let mut query = UnionQuery::new(Person)
            .columns(["name", "office.city"])
            .filter(Filter::equal("kind", "employee"));
        let sql = query.assemble().unwrap().to_string(PostgresQueryBuilder);
        assert!(sql.starts_with(r#"SELECT "person"."name" AS "name", "person_office"."city" AS "person_office_city" FROM (SELECT"#));
        assert!(sql.contains(
            r#"AS "person" INNER JOIN "office" AS "person_office" ON "person_office"."id" = "person"."office_id""#
        ));
        assert!(sql.ends_with(r#"WHERE "person"."kind" = 'employee'"#));
    }

    #[test]
    fn test_member_filter() {
        let member = UnionMember::new(|| Employee)
            .column("id", "id")
            .filter(Filter::equal("name", "Donald"));
        let select = member
            .select(&["id".to_string(), "name".to_string()], &QueryConfig::default())
            .unwrap();
        assert_eq!(
            select.to_string(PostgresQueryBuilder),
            r#"SELECT "employee"."id" AS "id", NULL AS "name" FROM "employee" WHERE "employee"."name" = 'Donald'"#
        );
    }
}
