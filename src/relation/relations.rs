//! Per-model relation directory

use crate::error::{OrmError, Result};
use crate::model::{Model, ModelRef};
use crate::relation::def::Relation;
use indexmap::IndexMap;

/// Named relations of one model
///
/// Names are unique per model; registering a name twice is a
/// [`Conflict`](crate::ErrorKind::Conflict).
#[derive(Debug, Clone)]
pub struct Relations {
    table: String,
    relations: IndexMap<String, Relation>,
}

impl Relations {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            relations: IndexMap::new(),
        }
    }

    /// Build the relation directory of `model` by running its relation builder
    pub fn for_model(model: &ModelRef) -> Result<Self> {
        let mut relations = Relations::new(model.table_name());
        model.create_relations(&mut relations)?;
        Ok(relations)
    }

    /// Table of the model owning these relations
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Register a relation
    pub fn add(&mut self, relation: Relation) -> Result<&mut Relation> {
        if self.relations.contains_key(relation.name()) {
            return Err(OrmError::DuplicateRelation {
                table: self.table.clone(),
                relation: relation.name().to_owned(),
            });
        }
        let name = relation.name().to_owned();
        Ok(self.relations.entry(name).or_insert(relation))
    }

    /// Register a to-one relation keyed by a foreign key on the target
    pub fn has_one<M, F>(&mut self, name: &str, target: F) -> Result<&mut Relation>
    where
        M: Model,
        F: Fn() -> M + Send + Sync + 'static,
    {
        self.add(Relation::has_one(name, target))
    }

    /// Register a to-one relation keyed by a foreign key on this model
    pub fn belongs_to<M, F>(&mut self, name: &str, target: F) -> Result<&mut Relation>
    where
        M: Model,
        F: Fn() -> M + Send + Sync + 'static,
    {
        self.add(Relation::belongs_to(name, target))
    }

    /// Register a to-many relation
    pub fn has_many<M, F>(&mut self, name: &str, target: F) -> Result<&mut Relation>
    where
        M: Model,
        F: Fn() -> M + Send + Sync + 'static,
    {
        self.add(Relation::has_many(name, target))
    }

    /// Register a many-to-many relation through the junction table `through`
    pub fn belongs_to_many<M, F>(&mut self, name: &str, target: F, through: &str) -> Result<&mut Relation>
    where
        M: Model,
        F: Fn() -> M + Send + Sync + 'static,
    {
        self.add(Relation::belongs_to_many(name, target, through))
    }

    /// Look up a relation by name
    pub fn get(&self, name: &str) -> Result<&Relation> {
        self.relations
            .get(name)
            .ok_or_else(|| OrmError::relation_not_found(&self.table, name))
    }

    pub fn has(&self, name: &str) -> bool {
        self.relations.contains_key(name)
    }

    /// Walk a dotted relation name (`employee.department`)
    ///
    /// Every segment after the first is looked up on a fresh instance of the
    /// previous segment's target. Returns the relations in traversal order.
    pub fn get_path(&self, path: &str) -> Result<Vec<Relation>> {
        let mut segments = path.split('.');
        let first = segments.next().unwrap_or_default();
        let mut current = self.get(first)?.clone();
        let mut walked = vec![current.clone()];

        for segment in segments {
            let target = current.create_target();
            let relations = Relations::for_model(&target)?;
            current = relations.get(segment)?.clone();
            walked.push(current.clone());
        }

        Ok(walked)
    }

    /// Relations in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Relation> {
        self.relations.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.relations.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}
