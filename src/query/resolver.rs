//! Column and relation path resolution
//!
//! The [`Resolver`] walks dotted paths (`employee.department.name`) through
//! the relation graph starting at the query's base model. Every relation
//! segment becomes a [`RelationStep`] carrying the joins it needs; the last
//! segment is the column. Query assembly and filter processing share one
//! resolver per query, so a path is resolved once and its joins are identical
//! wherever it is used.
//!
//! Per-model data (relations, behaviors, columns) is cached by [`ModelId`],
//! never by table name: two instances of the same model reached through
//! different paths are different targets.

use crate::behavior::{Behaviors, QueryContext, RewriteContext};
use crate::config::{Dialect, QueryConfig};
use crate::error::{OrmError, Result};
use crate::model::{ColumnExpr, Columns, ModelId, ModelRef};
use crate::query::join::JoinSpec;
use crate::relation::helpers::ident;
use crate::relation::{qualified_col, Relation, Relations};
use sea_query::{Asterisk, Expr};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;
#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

/// One traversed relation of a path
#[derive(Debug, Clone)]
pub struct RelationStep {
    /// Absolute relation path (`office.employee`)
    pub path: String,
    /// Absolute path of the parent (`office`)
    pub parent_path: String,
    pub relation: Relation,
    /// Target instance reached by this step
    pub model: ModelRef,
    /// Alias of the target table
    pub alias: String,
    /// Joins in order; the junction comes first for many-to-many relations
    pub joins: Vec<JoinSpec>,
}

impl RelationStep {
    pub fn is_to_many(&self) -> bool {
        self.relation.is_to_many()
    }
}

/// A resolved column path
#[derive(Debug, Clone)]
pub struct ResolvedColumn {
    /// Model owning the column
    pub model: ModelRef,
    /// Absolute relation path of the owning model (the base table for base columns)
    pub relation_path: String,
    pub table_alias: String,
    /// Bare column name, or `*`
    pub column: String,
    /// Absolute relation paths traversed, parents first
    pub steps: Vec<String>,
}

impl ResolvedColumn {
    pub fn is_base(&self) -> bool {
        self.steps.is_empty()
    }

    /// Absolute path of the column
    pub fn path(&self) -> String {
        format!("{}.{}", self.relation_path, self.column)
    }

    pub fn rewrite_context(&self, dialect: Dialect) -> RewriteContext<'_> {
        RewriteContext {
            relation_path: &self.relation_path,
            table_alias: &self.table_alias,
            dialect,
        }
    }
}

/// Per-query path resolver and model cache
#[derive(Debug)]
pub struct Resolver {
    base: ModelRef,
    config: QueryConfig,
    context: QueryContext,
    derived_base: bool,
    relations: HashMap<ModelId, Relations>,
    behaviors: HashMap<ModelId, Arc<Behaviors>>,
    columns: HashMap<ModelId, Columns>,
    selectable: HashMap<ModelId, HashSet<String>>,
    steps: HashMap<String, RelationStep>,
    resolved: HashMap<String, ResolvedColumn>,
    rewritten_paths: HashMap<String, Option<String>>,
    /// Paths being resolved, to detect virtual column cycles
    resolving: HashSet<String>,
}

impl Resolver {
    pub fn new(base: ModelRef, config: QueryConfig) -> Self {
        let context = QueryContext {
            dialect: config.dialect,
            base_table: base.table_name().to_owned(),
        };
        Self {
            base,
            config,
            context,
            derived_base: false,
            relations: HashMap::new(),
            behaviors: HashMap::new(),
            columns: HashMap::new(),
            selectable: HashMap::new(),
            steps: HashMap::new(),
            resolved: HashMap::new(),
            rewritten_paths: HashMap::new(),
            resolving: HashSet::new(),
        }
    }

    /// The base table is a derived table exposing every column by its alias
    pub(crate) fn set_derived_base(&mut self, derived: bool) {
        self.derived_base = derived;
    }

    pub fn base(&self) -> &ModelRef {
        &self.base
    }

    pub fn base_table(&self) -> &str {
        self.base.table_name()
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub fn dialect(&self) -> Dialect {
        self.config.dialect
    }

    /// Absolute form of a path: prefixed with the base table unless it already is
    pub fn canonical(&self, path: &str) -> String {
        let base = self.base.table_name();
        match path.split_once('.') {
            Some((first, _)) if first == base => path.to_owned(),
            _ => format!("{}.{}", base, path),
        }
    }

    /// Path relative to the base model (`office.audit.user` -> `audit.user`)
    pub fn relative<'a>(&self, path: &'a str) -> &'a str {
        path.strip_prefix(self.base.table_name())
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(path)
    }

    /// Relations of a model instance
    pub fn relations(&mut self, model: &ModelRef) -> Result<&Relations> {
        match self.relations.entry(model.id()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => Ok(entry.insert(Relations::for_model(model)?)),
        }
    }

    /// Behaviors of a model instance, attached to this query
    pub fn behaviors(&mut self, model: &ModelRef) -> Arc<Behaviors> {
        let context = &self.context;
        self.behaviors
            .entry(model.id())
            .or_insert_with(|| {
                let mut behaviors = Behaviors::for_model(model);
                behaviors.set_query(context);
                Arc::new(behaviors)
            })
            .clone()
    }

    fn model_columns(&mut self, model: &ModelRef) -> &Columns {
        self.columns.entry(model.id()).or_insert_with(|| model.columns())
    }

    /// Key columns followed by the declared columns, without duplicates
    pub fn select_columns(&mut self, model: &ModelRef) -> Vec<String> {
        let mut names = model.key_name().to_vec();
        for name in self.model_columns(model).keys() {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }

    /// Key columns and declared columns of a model
    pub fn selectable(&mut self, model: &ModelRef) -> &HashSet<String> {
        if !self.selectable.contains_key(&model.id()) {
            let names: HashSet<String> = self.select_columns(model).into_iter().collect();
            self.selectable.insert(model.id(), names);
        }
        self.selectable.entry(model.id()).or_default()
    }

    /// Step already resolved for an absolute relation path
    pub fn step_at(&self, path: &str) -> Option<&RelationStep> {
        self.steps.get(path)
    }

    /// Model instance at an absolute relation path
    pub fn model_at(&self, path: &str) -> Option<ModelRef> {
        if path == self.base.table_name() {
            return Some(self.base.clone());
        }
        self.steps.get(path).map(|step| step.model.clone())
    }

    fn step(&mut self, parent_path: &str, parent: &ModelRef, name: &str) -> Result<RelationStep> {
        let path = format!("{}.{}", parent_path, name);
        if let Some(step) = self.steps.get(&path) {
            return Ok(step.clone());
        }

        let relation = self.relations(parent)?.get(name)?.clone();
        let target = relation.create_target();
        let junction = relation.create_junction();
        let edges = relation.resolve(parent, &target, junction.as_ref())?;

        let alias = self.config.alias_for(&path);
        let parent_alias = self.config.alias_for(parent_path);
        let joins = match edges.as_slice() {
            [edge] => vec![JoinSpec {
                alias: alias.clone(),
                table: target.table_name().to_owned(),
                parent_alias,
                foreign_key: edge.foreign_key.clone(),
                candidate_key: edge.candidate_key.clone(),
                join_type: relation.join_type(),
            }],
            [to_junction, to_target] => {
                let junction_alias = self.config.column_alias(&alias, to_junction.to.table_name());
                vec![
                    JoinSpec {
                        alias: junction_alias.clone(),
                        table: to_junction.to.table_name().to_owned(),
                        parent_alias,
                        foreign_key: to_junction.foreign_key.clone(),
                        candidate_key: to_junction.candidate_key.clone(),
                        join_type: relation.join_type(),
                    },
                    JoinSpec {
                        alias: alias.clone(),
                        table: target.table_name().to_owned(),
                        parent_alias: junction_alias,
                        foreign_key: to_target.foreign_key.clone(),
                        candidate_key: to_target.candidate_key.clone(),
                        join_type: relation.join_type(),
                    },
                ]
            }
            _ => {
                return Err(OrmError::InvalidModel(format!(
                    "relation '{}' resolved to {} edges",
                    name,
                    edges.len()
                )))
            }
        };

        log::trace!("resolved relation {} as {}", path, alias);
        let step = RelationStep {
            path: path.clone(),
            parent_path: parent_path.to_owned(),
            relation,
            model: target,
            alias,
            joins,
        };
        self.steps.insert(path, step.clone());
        Ok(step)
    }

    /// Resolve a path made of relation names only (`employee.department`)
    pub fn resolve_relation_path(&mut self, path: &str) -> Result<Vec<RelationStep>> {
        let absolute = self.canonical(path);
        let mut model = self.base.clone();
        let mut current = self.base.table_name().to_owned();
        let mut steps = Vec::new();

        for segment in absolute.split('.').skip(1) {
            let step = self.step(&current, &model, segment)?;
            model = step.model.clone();
            current = step.path.clone();
            steps.push(step);
        }
        Ok(steps)
    }

    /// Resolve a column path (`employee.department.name`, `city`, `employee.*`)
    pub fn resolve_column(&mut self, path: &str) -> Result<ResolvedColumn> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::resolve_span(path).entered();

        let absolute = self.canonical(path);
        if let Some(resolved) = self.resolved.get(&absolute) {
            return Ok(resolved.clone());
        }

        if !self.resolving.insert(absolute.clone()) {
            return Err(OrmError::InvalidModel(format!(
                "virtual column cycle through '{}'",
                absolute
            )));
        }
        let result = self.walk(&absolute);
        self.resolving.remove(&absolute);
        #[cfg(feature = "metrics")]
        if result.is_err() {
            METRICS.record_resolve_error();
        }
        let resolved = result?;
        self.resolved.insert(absolute, resolved.clone());
        Ok(resolved)
    }

    fn walk(&mut self, absolute: &str) -> Result<ResolvedColumn> {
        let segments: Vec<&str> = absolute.split('.').skip(1).collect();
        let Some((column, relations)) = segments.split_last() else {
            return Err(OrmError::column_not_found(self.base.table_name(), absolute));
        };

        let mut model = self.base.clone();
        let mut relation_path = self.base.table_name().to_owned();
        let mut steps = Vec::with_capacity(relations.len());
        for segment in relations {
            let step = self.step(&relation_path, &model, segment)?;
            model = step.model.clone();
            relation_path = step.path.clone();
            steps.push(step.path);
        }

        if let Some(rewritten) = self.rewrite_path(&model, &relation_path, column) {
            log::trace!("rewrote {}.{} to {}", relation_path, column, rewritten);
            return self.resolve_column(&rewritten);
        }

        if *column != "*" && !self.selectable(&model).contains(*column) {
            return Err(OrmError::column_not_found(model.table_name(), column));
        }

        Ok(ResolvedColumn {
            table_alias: self.config.alias_for(&relation_path),
            model,
            relation_path,
            column: (*column).to_owned(),
            steps,
        })
    }

    /// Virtual column lookup, memoized per absolute path
    fn rewrite_path(&mut self, model: &ModelRef, relation_path: &str, column: &str) -> Option<String> {
        let key = format!("{}.{}", relation_path, column);
        if let Some(rewritten) = self.rewritten_paths.get(&key) {
            return rewritten.clone();
        }
        let rewritten = self
            .behaviors(model)
            .rewrite_path(column)
            .filter(|path| path != column)
            .map(|path| format!("{}.{}", relation_path, path));
        self.rewritten_paths.insert(key, rewritten.clone());
        rewritten
    }

    /// SQL expression of a resolved column
    ///
    /// Column rewrites of the owning model's behaviors take precedence over
    /// the declared column expression.
    pub fn qualify(&mut self, resolved: &ResolvedColumn) -> Expr {
        if resolved.column == "*" {
            return Expr::col((ident(&resolved.table_alias), Asterisk));
        }
        let behaviors = self.behaviors(&resolved.model);
        let context = resolved.rewrite_context(self.config.dialect);
        if let Some(expr) = behaviors.rewrite_column(&resolved.column, &context) {
            return expr;
        }
        self.column_expr(resolved)
    }

    fn column_expr(&mut self, resolved: &ResolvedColumn) -> Expr {
        let alias = resolved.table_alias.as_str();
        if resolved.is_base() && self.derived_base {
            return qualified_col(alias, &resolved.column);
        }
        let dialect = self.config.dialect;
        match self.model_columns(&resolved.model).get(&resolved.column) {
            Some(ColumnExpr::Column(name)) => qualified_col(alias, name),
            Some(ColumnExpr::Raw(sql)) => Expr::cust(sql.replace("{table}", &dialect.quote(alias))),
            None => qualified_col(alias, &resolved.column),
        }
    }

    /// Key columns of the base model, qualified by the base alias
    pub fn base_key_exprs(&self) -> Vec<Expr> {
        let alias = self.config.alias_for(self.base.table_name());
        self.base
            .key_name()
            .iter()
            .map(|column| qualified_col(&alias, column))
            .collect()
    }
}
