//! Relation definitions
//!
//! A [`Relation`] is one named, typed edge from a source model to a target
//! model. Resolving it against concrete model instances yields the ordered
//! list of [`RelationEdge`]s that have to be joined: one edge for to-one and
//! to-many relations, two edges (source -> junction, junction -> target) for
//! many-to-many relations.

use crate::error::{OrmError, Result};
use crate::model::{factory, Columns, Model, ModelFactory, ModelRef};
use crate::query::JoinKind;
use crate::relation::identity::Identity;
use crate::relation::Relations;
use std::fmt;

/// Type of relationship between models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// At most one target row per source row
    ToOne,
    /// Any number of target rows per source row
    ToMany,
    /// Any number of target rows, linked through a junction table
    ManyToMany,
}

impl RelationKind {
    /// Whether joining this relation may multiply source rows
    pub fn is_to_many(&self) -> bool {
        matches!(self, RelationKind::ToMany | RelationKind::ManyToMany)
    }
}

/// Junction of a many-to-many relation
#[derive(Clone)]
pub enum Through {
    /// A bare table name
    Table(String),
    /// A full model whose own relations may declare the keys
    Model(ModelFactory),
}

impl fmt::Debug for Through {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Through::Table(table) => f.debug_tuple("Table").field(table).finish(),
            Through::Model(_) => f.write_str("Model(..)"),
        }
    }
}

/// Junction table given by name only
#[derive(Debug)]
pub(crate) struct JunctionTable {
    table: String,
}

impl Model for JunctionTable {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn key_name(&self) -> Identity {
        Identity::Many(Vec::new())
    }

    fn columns(&self) -> Columns {
        Columns::new()
    }
}

/// One join step: `to.foreign_key = from.candidate_key`
#[derive(Debug, Clone)]
pub struct RelationEdge {
    pub from: ModelRef,
    pub to: ModelRef,
    /// Column(s) on `from`
    pub candidate_key: Identity,
    /// Column(s) on `to`
    pub foreign_key: Identity,
}

/// Defines a relationship between two models
#[derive(Clone)]
pub struct Relation {
    name: String,
    kind: RelationKind,
    inverse: bool,
    target: ModelFactory,
    candidate_key: Option<Identity>,
    foreign_key: Option<Identity>,
    join_type: JoinKind,
    through: Option<Through>,
    target_candidate_key: Option<Identity>,
    target_foreign_key: Option<Identity>,
}

impl fmt::Debug for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relation")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("inverse", &self.inverse)
            .field("candidate_key", &self.candidate_key)
            .field("foreign_key", &self.foreign_key)
            .field("join_type", &self.join_type)
            .field("through", &self.through)
            .field("target_candidate_key", &self.target_candidate_key)
            .field("target_foreign_key", &self.target_foreign_key)
            .finish()
    }
}

impl Relation {
    /// Create a relation to the models produced by `target`
    pub fn new(name: impl Into<String>, kind: RelationKind, target: ModelFactory) -> Self {
        Self {
            name: name.into(),
            kind,
            inverse: false,
            target,
            candidate_key: None,
            foreign_key: None,
            join_type: JoinKind::Inner,
            through: None,
            target_candidate_key: None,
            target_foreign_key: None,
        }
    }

    /// To-one relation whose foreign key lives on the target (`has one`)
    pub fn has_one<M, F>(name: impl Into<String>, target: F) -> Self
    where
        M: Model,
        F: Fn() -> M + Send + Sync + 'static,
    {
        Self::new(name, RelationKind::ToOne, factory(target))
    }

    /// To-one relation whose foreign key lives on the source (`belongs to`)
    pub fn belongs_to<M, F>(name: impl Into<String>, target: F) -> Self
    where
        M: Model,
        F: Fn() -> M + Send + Sync + 'static,
    {
        let mut relation = Self::new(name, RelationKind::ToOne, factory(target));
        relation.inverse = true;
        relation
    }

    /// To-many relation whose foreign key lives on the target
    pub fn has_many<M, F>(name: impl Into<String>, target: F) -> Self
    where
        M: Model,
        F: Fn() -> M + Send + Sync + 'static,
    {
        Self::new(name, RelationKind::ToMany, factory(target))
    }

    /// Many-to-many relation through the junction table `through`
    pub fn belongs_to_many<M, F>(name: impl Into<String>, target: F, through: impl Into<String>) -> Self
    where
        M: Model,
        F: Fn() -> M + Send + Sync + 'static,
    {
        let mut relation = Self::new(name, RelationKind::ManyToMany, factory(target));
        relation.through = Some(Through::Table(through.into()));
        relation
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> RelationKind {
        self.kind
    }

    pub fn is_to_many(&self) -> bool {
        self.kind.is_to_many()
    }

    pub fn join_type(&self) -> JoinKind {
        self.join_type
    }

    pub fn through(&self) -> Option<&Through> {
        self.through.as_ref()
    }

    pub fn candidate_key(&self) -> Option<&Identity> {
        self.candidate_key.as_ref()
    }

    pub fn foreign_key(&self) -> Option<&Identity> {
        self.foreign_key.as_ref()
    }

    /// Column(s) on the source side
    pub fn set_candidate_key(&mut self, key: impl Into<Identity>) -> &mut Self {
        self.candidate_key = Some(key.into());
        self
    }

    /// Column(s) on the target side (on the junction for many-to-many)
    pub fn set_foreign_key(&mut self, key: impl Into<Identity>) -> &mut Self {
        self.foreign_key = Some(key.into());
        self
    }

    /// Declare the relation optional (`JoinKind::Left`) or mandatory
    pub fn set_join_type(&mut self, join_type: JoinKind) -> &mut Self {
        self.join_type = join_type;
        self
    }

    /// Use a bare junction table
    pub fn set_through_table(&mut self, table: impl Into<String>) -> &mut Self {
        self.through = Some(Through::Table(table.into()));
        self
    }

    /// Use a junction model whose relations may declare the keys
    pub fn set_through<M, F>(&mut self, junction: F) -> &mut Self
    where
        M: Model,
        F: Fn() -> M + Send + Sync + 'static,
    {
        self.through = Some(Through::Model(factory(junction)));
        self
    }

    /// Column(s) on the target of a many-to-many relation
    pub fn set_target_candidate_key(&mut self, key: impl Into<Identity>) -> &mut Self {
        self.target_candidate_key = Some(key.into());
        self
    }

    /// Column(s) on the junction referencing the target of a many-to-many relation
    pub fn set_target_foreign_key(&mut self, key: impl Into<Identity>) -> &mut Self {
        self.target_foreign_key = Some(key.into());
        self
    }

    /// Create a fresh instance of the target model
    pub fn create_target(&self) -> ModelRef {
        (self.target)()
    }

    /// Create a fresh instance of the junction model, if this relation has one
    pub fn create_junction(&self) -> Option<ModelRef> {
        match self.through.as_ref()? {
            Through::Table(table) => Some(ModelRef::new(JunctionTable {
                table: table.clone(),
            })),
            Through::Model(create) => Some(create()),
        }
    }

    /// Determine `(candidate_key, foreign_key)` of a to-one or to-many relation
    ///
    /// The candidate key lives on `source`, the foreign key on `target`.
    pub fn determine_keys(&self, source: &dyn Model, target: &dyn Model) -> Result<(Identity, Identity)> {
        let (candidate, foreign) = if self.inverse {
            let foreign = self
                .foreign_key
                .clone()
                .unwrap_or_else(|| target.key_name());
            let candidate = self
                .candidate_key
                .clone()
                .unwrap_or_else(|| foreign.prefixed(target.table_name()));
            (candidate, foreign)
        } else {
            let candidate = self
                .candidate_key
                .clone()
                .unwrap_or_else(|| source.key_name());
            let foreign = self
                .foreign_key
                .clone()
                .unwrap_or_else(|| candidate.prefixed(source.table_name()));
            (candidate, foreign)
        };

        self.check_arity(&candidate, &foreign)?;
        Ok((candidate, foreign))
    }

    /// Resolve this relation into the edges to join, in join order
    ///
    /// Many-to-many relations need the `junction` instance and produce two
    /// edges. Their keys are taken, per key, from the first source that
    /// provides one: explicitly configured keys, the junction model's own
    /// relations to the source/target (the last matching relation wins), and
    /// finally the defaults (model key paired with `<table>_<key>`).
    pub fn resolve(
        &self,
        source: &ModelRef,
        target: &ModelRef,
        junction: Option<&ModelRef>,
    ) -> Result<Vec<RelationEdge>> {
        if self.kind != RelationKind::ManyToMany {
            let (candidate_key, foreign_key) = self.determine_keys(&**source, &**target)?;
            return Ok(vec![RelationEdge {
                from: source.clone(),
                to: target.clone(),
                candidate_key,
                foreign_key,
            }]);
        }

        let junction = junction.ok_or_else(|| {
            OrmError::InvalidModel(format!(
                "many-to-many relation '{}' on '{}' has no junction",
                self.name,
                source.table_name()
            ))
        })?;

        // Defaults
        let mut candidate = source.key_name();
        let mut foreign = candidate.prefixed(source.table_name());
        let mut target_candidate = target.key_name();
        let mut target_foreign = target_candidate.prefixed(target.table_name());

        // Keys declared by the junction model
        if let Some(Through::Model(_)) = self.through {
            let relations = Relations::for_model(junction)?;
            for relation in relations.iter() {
                let related = relation.create_target();
                let (junction_key, related_key) = relation.determine_keys(&**junction, &*related)?;
                if related.table_name() == source.table_name() {
                    candidate = related_key.clone();
                    foreign = junction_key.clone();
                }
                if related.table_name() == target.table_name() {
                    target_candidate = related_key;
                    target_foreign = junction_key;
                }
            }
        }

        // Explicit keys
        if let Some(key) = &self.candidate_key {
            candidate = key.clone();
        }
        if let Some(key) = &self.foreign_key {
            foreign = key.clone();
        }
        if let Some(key) = &self.target_candidate_key {
            target_candidate = key.clone();
        }
        if let Some(key) = &self.target_foreign_key {
            target_foreign = key.clone();
        }

        self.check_arity(&candidate, &foreign)?;
        self.check_arity(&target_foreign, &target_candidate)?;

        Ok(vec![
            RelationEdge {
                from: source.clone(),
                to: junction.clone(),
                candidate_key: candidate,
                foreign_key: foreign,
            },
            RelationEdge {
                from: junction.clone(),
                to: target.clone(),
                candidate_key: target_foreign,
                foreign_key: target_candidate,
            },
        ])
    }

    fn check_arity(&self, candidate: &Identity, foreign: &Identity) -> Result<()> {
        if candidate.arity() != foreign.arity() || candidate.arity() == 0 {
            return Err(OrmError::KeyArityMismatch {
                relation: self.name.clone(),
                candidate: candidate.arity(),
                foreign: foreign.arity(),
            });
        }
        Ok(())
    }
}
