//! Join specifications and the per-statement join registry

use crate::query::resolver::RelationStep;
use crate::relation::helpers::ident;
use crate::relation::{join_on_condition, Identity};
use indexmap::IndexMap;
use sea_query::{Condition, JoinType, SelectStatement};

/// SQL join type of a relation join
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
}

impl From<JoinKind> for JoinType {
    fn from(kind: JoinKind) -> Self {
        match kind {
            JoinKind::Inner => JoinType::InnerJoin,
            JoinKind::Left => JoinType::LeftJoin,
        }
    }
}

/// One aliased table join: `JOIN table AS alias ON alias.fk = parent.ck`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSpec {
    pub alias: String,
    pub table: String,
    pub parent_alias: String,
    /// Column(s) on `alias`
    pub foreign_key: Identity,
    /// Column(s) on `parent_alias`
    pub candidate_key: Identity,
    /// Join type declared by the relation
    pub join_type: JoinKind,
}

impl JoinSpec {
    pub fn on_condition(&self) -> Condition {
        join_on_condition(&self.alias, &self.foreign_key, &self.parent_alias, &self.candidate_key)
    }

    /// Add this join to `statement` as a `join_type` join
    pub fn apply(&self, statement: &mut SelectStatement, join_type: JoinKind) {
        statement.join_as(
            join_type.into(),
            ident(&self.table),
            ident(&self.alias),
            self.on_condition(),
        );
    }
}

/// Why a join was required; lower variants win when a path is required twice
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JoinPurpose {
    /// Eager-loaded relation
    Eager,
    /// Projected column or `utilize`
    Projection,
    /// Ordering only
    Order,
    /// Filtering only
    Filter,
}

impl JoinPurpose {
    /// Join type used for a newly required path
    ///
    /// Joins that only filter or order are outer joins so that they never
    /// remove base rows by themselves.
    fn join_kind(&self, declared: JoinKind) -> JoinKind {
        match self {
            JoinPurpose::Eager | JoinPurpose::Projection => declared,
            JoinPurpose::Order | JoinPurpose::Filter => JoinKind::Left,
        }
    }
}

/// A relation path the statement joins
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredJoin {
    pub path: String,
    pub parent_path: String,
    pub join_type: JoinKind,
    pub purpose: JoinPurpose,
}

/// Relation paths to join, in the order they were first required
#[derive(Debug, Clone, Default)]
pub struct JoinRegistry {
    joins: IndexMap<String, RequiredJoin>,
}

impl JoinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require the join of `step`
    ///
    /// Requiring a path twice keeps the first join type and only lowers the
    /// purpose. A child of a LEFT joined path is LEFT joined too. Returns
    /// `true` when the path was not registered before.
    pub fn require(&mut self, step: &RelationStep, purpose: JoinPurpose, forced: Option<JoinKind>) -> bool {
        if let Some(existing) = self.joins.get_mut(&step.path) {
            existing.purpose = existing.purpose.min(purpose);
            return false;
        }

        let parent_is_left = self
            .joins
            .get(&step.parent_path)
            .is_some_and(|parent| parent.join_type == JoinKind::Left);
        let join_type = match forced {
            Some(kind) => kind,
            None if parent_is_left => JoinKind::Left,
            None => purpose.join_kind(step.relation.join_type()),
        };

        log::trace!("require join {} ({:?}, {:?})", step.path, join_type, purpose);
        self.joins.insert(
            step.path.clone(),
            RequiredJoin {
                path: step.path.clone(),
                parent_path: step.parent_path.clone(),
                join_type,
                purpose,
            },
        );
        true
    }

    pub fn contains(&self, path: &str) -> bool {
        self.joins.contains_key(path)
    }

    pub fn get(&self, path: &str) -> Option<&RequiredJoin> {
        self.joins.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RequiredJoin> {
        self.joins.values()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.joins.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.joins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    pub fn clear(&mut self) {
        self.joins.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_query::{Expr, PostgresQueryBuilder, Query};

    #[test]
    fn test_apply_join() {
        let spec = JoinSpec {
            alias: "office_employee".into(),
            table: "employee".into(),
            parent_alias: "office".into(),
            foreign_key: "office_id".into(),
            candidate_key: "id".into(),
            join_type: JoinKind::Inner,
        };
        let mut statement = Query::select();
        statement.expr(Expr::val(1)).from(ident("office"));
        spec.apply(&mut statement, JoinKind::Left);
        assert_eq!(
            statement.to_string(PostgresQueryBuilder),
            r#"SELECT 1 FROM "office" LEFT JOIN "employee" AS "office_employee" ON "office_employee"."office_id" = "office"."id""#
        );
    }

    #[test]
    fn test_purpose_ordering() {
        assert!(JoinPurpose::Eager < JoinPurpose::Filter);
        assert_eq!(JoinPurpose::Filter.min(JoinPurpose::Projection), JoinPurpose::Projection);
        assert_eq!(JoinPurpose::Filter.join_kind(JoinKind::Inner), JoinKind::Left);
        assert_eq!(JoinPurpose::Eager.join_kind(JoinKind::Inner), JoinKind::Inner);
    }
}
