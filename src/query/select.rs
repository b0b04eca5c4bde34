//! SELECT assembly
//!
//! A [`Query`] collects what the caller asks for (columns, eager-loaded
//! relations, a filter, ordering) and turns it into one aliased
//! `SelectStatement`. All paths go through the query's [`Resolver`], so a
//! relation reached by a projected column, an eager load and a filter
//! condition is joined exactly once.
//!
//! # Example
//!
//! ```no_run
//! use undertow::{Filter, Query};
//! # use undertow::{column_list, Columns, Identity, Model, Relations, Result};
//! # struct Office;
//! # struct Employee;
//! # impl Model for Office {
//! #     fn table_name(&self) -> &str { "office" }
//! #     fn key_name(&self) -> Identity { "id".into() }
//! #     fn columns(&self) -> Columns { column_list(["city"]) }
//! #     fn create_relations(&self, relations: &mut Relations) -> Result<()> {
//! #         relations.has_many("employee", || Employee)?;
//! #         Ok(())
//! #     }
//! # }
//! # impl Model for Employee {
//! #     fn table_name(&self) -> &str { "employee" }
//! #     fn key_name(&self) -> Identity { "id".into() }
//! #     fn columns(&self) -> Columns { column_list(["name", "office_id"]) }
//! # }
//!
//! let mut query = Query::new(Office)
//!     .with("employee")
//!     .filter(Filter::equal("employee.name", "Donald"))
//!     .limit(10);
//! let sql = query.to_sql()?;
//! # Ok::<(), undertow::OrmError>(())
//! ```

use crate::config::QueryConfig;
use crate::error::{OrmError, Result};
use crate::filter::{Filter, FilterProcessor};
use crate::hydrator::{Hydrator, Row};
use crate::model::{Model, ModelRef};
use crate::query::column::SelectColumn;
use crate::query::join::{JoinKind, JoinPurpose, JoinRegistry};
use crate::query::resolver::{ResolvedColumn, Resolver};
use crate::query::union::UnionMember;
use crate::relation::helpers::ident;
use crate::result_set::ResultSet;
use indexmap::{IndexMap, IndexSet};
use sea_query::{Asterisk, Expr, Func, Order, Query as SeaQuery, SelectStatement, UnionType, Values};
use std::collections::HashSet;

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;
#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

/// What the base alias selects from
#[derive(Debug, Clone)]
pub(crate) enum Source {
    Table,
    /// `UNION ALL` of the members, wrapped as a derived table
    Union(Vec<UnionMember>),
}

/// A projected row key and the property it hydrates
#[derive(Debug, Clone)]
struct Projected {
    row_key: String,
    /// Absolute relation path of the owning model
    relation_path: String,
    property: String,
}

/// SELECT builder over one base model
#[derive(Debug)]
pub struct Query {
    resolver: Resolver,
    source: Source,
    columns: Vec<SelectColumn>,
    eager: IndexSet<String>,
    optional: HashSet<String>,
    utilized: IndexSet<String>,
    filter: Option<Filter>,
    orders: Vec<(String, Order)>,
    limit: Option<u64>,
    offset: Option<u64>,
    registry: JoinRegistry,
    projection: Vec<Projected>,
}

impl Query {
    pub fn new<M: Model>(model: M) -> Self {
        Self::from_ref(ModelRef::new(model))
    }

    /// Query an existing model instance
    pub fn from_ref(model: ModelRef) -> Self {
        Self {
            resolver: Resolver::new(model, QueryConfig::default()),
            source: Source::Table,
            columns: Vec::new(),
            eager: IndexSet::new(),
            optional: HashSet::new(),
            utilized: IndexSet::new(),
            filter: None,
            orders: Vec::new(),
            limit: None,
            offset: None,
            registry: JoinRegistry::new(),
            projection: Vec::new(),
        }
    }

    pub(crate) fn with_source(mut self, source: Source) -> Self {
        self.resolver.set_derived_base(matches!(source, Source::Union(_)));
        self.source = source;
        self
    }

    /// Replace the configuration; resets everything resolved so far
    pub fn with_config(mut self, config: QueryConfig) -> Self {
        let base = self.resolver.base().clone();
        self.resolver = Resolver::new(base, config);
        self.resolver.set_derived_base(matches!(self.source, Source::Union(_)));
        self
    }

    /// Project exactly these columns
    pub fn columns<I, C>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<SelectColumn>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Add one column to the projection
    pub fn column(mut self, column: impl Into<SelectColumn>) -> Self {
        self.columns.push(column.into());
        self
    }

    /// Eager-load a relation path, joining it with the declared join types
    pub fn with(mut self, path: &str) -> Self {
        let absolute = self.resolver.canonical(path);
        self.eager.insert(absolute);
        self
    }

    /// Eager-load a relation path, LEFT joining every segment of it
    pub fn with_optional(mut self, path: &str) -> Self {
        let absolute = self.resolver.canonical(path);
        let mut prefix = String::new();
        for segment in absolute.split('.') {
            if !prefix.is_empty() {
                prefix.push('.');
                prefix.push_str(segment);
                self.optional.insert(prefix.clone());
            } else {
                prefix.push_str(segment);
            }
        }
        self.eager.insert(absolute);
        self
    }

    /// Join a relation path without projecting it
    pub fn utilize(mut self, path: &str) -> Self {
        let absolute = self.resolver.canonical(path);
        self.utilized.insert(absolute);
        self
    }

    /// Add a filter; several filters are combined with AND
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(current) => current.and(filter),
            None => filter,
        });
        self
    }

    pub fn order_by(mut self, path: &str, order: Order) -> Self {
        self.orders.push((path.to_owned(), order));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn base(&self) -> &ModelRef {
        self.resolver.base()
    }

    pub fn config(&self) -> &QueryConfig {
        self.resolver.config()
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut Resolver {
        &mut self.resolver
    }

    /// Joins required by the last assembly, in emission order
    pub fn joins(&self) -> &JoinRegistry {
        &self.registry
    }

    /// Assemble the SELECT statement
    pub fn assemble(&mut self) -> Result<SelectStatement> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::assemble_span(self.resolver.base_table()).entered();
        #[cfg(feature = "metrics")]
        let started = std::time::Instant::now();

        let statement = self.build_statement(true)?;

        #[cfg(feature = "metrics")]
        METRICS.record_statement(started.elapsed(), self.registry.len());
        if self.resolver.config().log_statements {
            log::debug!("{}", self.resolver.dialect().render(&statement));
        }
        Ok(statement)
    }

    /// `SELECT COUNT(*)` over the filtered statement, without ordering or paging
    pub fn assemble_count(&mut self) -> Result<SelectStatement> {
        let inner = self.build_statement(false)?;
        let mut statement = SeaQuery::select();
        statement
            .expr_as(Func::count(Expr::col(Asterisk)), ident("count"))
            .from_subquery(inner, ident("count_source"));
        if self.resolver.config().log_statements {
            log::debug!("{}", self.resolver.dialect().render(&statement));
        }
        Ok(statement)
    }

    /// Assemble and render with values inlined
    pub fn to_sql(&mut self) -> Result<String> {
        let statement = self.assemble()?;
        Ok(self.resolver.dialect().render(&statement))
    }

    /// Assemble and render with placeholders
    pub fn build(&mut self) -> Result<(String, Values)> {
        let statement = self.assemble()?;
        Ok(self.resolver.dialect().build(&statement))
    }

    /// Hydrator matching the projection of this query
    ///
    /// Every relation path with projected columns gets its own entry, and so
    /// does each of its parents.
    pub fn create_hydrator(&mut self) -> Result<Hydrator> {
        self.build_statement(true)?;

        let base = self.resolver.base().clone();
        let base_table = base.table_name().to_owned();
        let mut hydrator = Hydrator::new(base.clone(), self.resolver.behaviors(&base));

        let mut nested: IndexMap<String, IndexMap<String, String>> = IndexMap::new();
        for projected in &self.projection {
            if projected.relation_path == base_table {
                hydrator.map_column(projected.row_key.clone(), projected.property.clone());
            } else {
                nested
                    .entry(projected.relation_path.clone())
                    .or_default()
                    .insert(projected.row_key.clone(), projected.property.clone());
            }
        }

        let mut paths = IndexSet::new();
        for path in nested.keys() {
            let mut prefix = base_table.clone();
            for segment in self.resolver.relative(path).split('.') {
                prefix = format!("{}.{}", prefix, segment);
                paths.insert(prefix.clone());
            }
        }

        for path in paths {
            let model = self
                .resolver
                .model_at(&path)
                .ok_or_else(|| OrmError::relation_not_found(&base_table, &path))?;
            let behaviors = self.resolver.behaviors(&model);
            let columns = nested.shift_remove(&path).unwrap_or_default();
            hydrator.add(self.resolver.relative(&path), model, behaviors, columns)?;
        }
        Ok(hydrator)
    }

    /// Wrap fetched rows into a lazily hydrating result set
    pub fn result_set<R>(&mut self, rows: R) -> Result<ResultSet<R::IntoIter>>
    where
        R: IntoIterator<Item = Row>,
    {
        Ok(ResultSet::new(rows, self.create_hydrator()?))
    }

    fn build_statement(&mut self, paged: bool) -> Result<SelectStatement> {
        self.registry.clear();
        self.projection.clear();

        let source = self.source_statement()?;
        let mut statement = source.clone();

        for path in self.eager.clone() {
            self.require_path(&path, JoinPurpose::Eager)?;
        }
        for path in self.utilized.clone() {
            self.require_path(&path, JoinPurpose::Projection)?;
        }

        self.project(&mut statement)?;

        if let Some(filter) = &self.filter {
            let declared: HashSet<String> = self.registry.paths().map(str::to_owned).collect();
            let processed = {
                #[cfg(feature = "tracing")]
                let _span = tracing_helpers::filter_span(self.resolver.base_table()).entered();
                FilterProcessor::new(&mut self.resolver, &declared, &source).process(filter)?
            };
            for path in &processed.required_joins {
                if let Some(step) = self.resolver.step_at(path) {
                    self.registry.require(step, JoinPurpose::Filter, None);
                }
            }
            if !processed.condition.is_empty() {
                statement.cond_where(processed.condition);
            }
        }

        if paged {
            for (path, order) in self.orders.clone() {
                let resolved = self.resolver.resolve_column(&path)?;
                self.require_steps(&resolved, JoinPurpose::Order);
                statement.order_by_expr(self.resolver.qualify(&resolved), order);
            }
            if let Some(limit) = self.limit {
                statement.limit(limit);
            }
            if let Some(offset) = self.offset {
                statement.offset(offset);
            }
        }

        for join in self.registry.iter() {
            if let Some(step) = self.resolver.step_at(&join.path) {
                for spec in &step.joins {
                    spec.apply(&mut statement, join.join_type);
                }
            }
        }
        Ok(statement)
    }

    /// `SELECT FROM <base>` without columns
    fn source_statement(&mut self) -> Result<SelectStatement> {
        let table = self.resolver.base_table().to_owned();
        let mut statement = SeaQuery::select();
        match self.source.clone() {
            Source::Table => {
                statement.from(ident(&table));
            }
            Source::Union(members) => {
                let union = self.union_statement(&table, &members)?;
                statement.from_subquery(union, ident(&table));
            }
        }
        Ok(statement)
    }

    fn union_statement(&mut self, table: &str, members: &[UnionMember]) -> Result<SelectStatement> {
        let base = self.resolver.base().clone();
        let outer_columns = self.resolver.select_columns(&base);
        let config = self.resolver.config().clone();

        let mut selects = members
            .iter()
            .map(|member| member.select(&outer_columns, &config))
            .collect::<Result<Vec<_>>>()?
            .into_iter();
        let mut union = selects
            .next()
            .ok_or_else(|| OrmError::InvalidModel(format!("union model '{}' declares no members", table)))?;
        for select in selects {
            union.union(UnionType::All, select);
        }
        Ok(union)
    }

    fn require_path(&mut self, path: &str, purpose: JoinPurpose) -> Result<()> {
        for step in self.resolver.resolve_relation_path(path)? {
            let forced = self.optional.contains(&step.path).then_some(JoinKind::Left);
            self.registry.require(&step, purpose, forced);
        }
        Ok(())
    }

    fn require_steps(&mut self, resolved: &ResolvedColumn, purpose: JoinPurpose) {
        for path in &resolved.steps {
            if let Some(step) = self.resolver.step_at(path) {
                self.registry.require(step, purpose, None);
            }
        }
    }

    fn project(&mut self, statement: &mut SelectStatement) -> Result<()> {
        let base_table = self.resolver.base_table().to_owned();

        if !self.columns.is_empty() {
            for column in self.columns.clone() {
                self.project_column(statement, &column)?;
            }
        } else if self.eager.is_empty() {
            self.project_model(statement, &base_table, false)?;
        } else {
            let mut paths = vec![base_table];
            paths.extend(
                self.registry
                    .iter()
                    .filter(|join| join.purpose == JoinPurpose::Eager)
                    .map(|join| join.path.clone()),
            );
            for path in paths {
                self.project_model(statement, &path, true)?;
            }
        }
        Ok(())
    }

    /// Project the key and declared columns of the model at `relation_path`
    ///
    /// With `aliased`, row keys are `<table alias>_<column>`; otherwise the bare
    /// column names.
    fn project_model(&mut self, statement: &mut SelectStatement, relation_path: &str, aliased: bool) -> Result<()> {
        let model = self
            .resolver
            .model_at(relation_path)
            .ok_or_else(|| OrmError::relation_not_found(self.resolver.base_table(), relation_path))?;
        let table_alias = self.resolver.config().alias_for(relation_path);

        for name in self.resolver.select_columns(&model) {
            let resolved = self.resolver.resolve_column(&format!("{}.{}", relation_path, name))?;
            self.require_steps(&resolved, JoinPurpose::Projection);
            let row_key = if aliased {
                self.resolver.config().column_alias(&table_alias, &name)
            } else {
                name.clone()
            };
            statement.expr_as(self.resolver.qualify(&resolved), ident(&row_key));
            self.projection.push(Projected {
                row_key,
                relation_path: relation_path.to_owned(),
                property: name,
            });
        }
        Ok(())
    }

    fn project_column(&mut self, statement: &mut SelectStatement, column: &SelectColumn) -> Result<()> {
        let base_table = self.resolver.base_table().to_owned();
        match column {
            SelectColumn::Asterisk => {
                let alias = self.resolver.config().alias_for(&base_table);
                statement.column((ident(&alias), Asterisk));
                let base = self.resolver.base().clone();
                for name in self.resolver.select_columns(&base) {
                    self.projection.push(Projected {
                        row_key: name.clone(),
                        relation_path: base_table.clone(),
                        property: name,
                    });
                }
            }
            SelectColumn::Path(path) => {
                let resolved = self.resolver.resolve_column(path)?;
                self.require_steps(&resolved, JoinPurpose::Projection);
                if resolved.column == "*" {
                    return self.project_model(statement, &resolved.relation_path, !resolved.is_base());
                }
                let row_key = if resolved.is_base() {
                    resolved.column.clone()
                } else {
                    self.resolver
                        .config()
                        .column_alias(&resolved.table_alias, &resolved.column)
                };
                statement.expr_as(self.resolver.qualify(&resolved), ident(&row_key));
                self.projection.push(Projected {
                    row_key,
                    relation_path: resolved.relation_path.clone(),
                    property: resolved.column.clone(),
                });
            }
            SelectColumn::Aliased { alias, path } => {
                let resolved = self.resolver.resolve_column(path)?;
                self.require_steps(&resolved, JoinPurpose::Projection);
                statement.expr_as(self.resolver.qualify(&resolved), ident(alias));
                self.projection.push(Projected {
                    row_key: alias.clone(),
                    relation_path: resolved.relation_path.clone(),
                    property: alias.clone(),
                });
            }
            SelectColumn::Expression { alias, expr } => {
                statement.expr_as(expr.clone(), ident(alias));
                self.projection.push(Projected {
                    row_key: alias.clone(),
                    relation_path: base_table,
                    property: alias.clone(),
                });
            }
        }
        Ok(())
    }
}
