//! Row hydration
//!
//! A [`Hydrator`] is built once per query from the projection and applied to
//! every row. It holds one column map for the base model and one per
//! eager-loaded relation path, so two relations projecting a column of the
//! same name never collide: each map is keyed by alias-qualified row keys.

use crate::behavior::Behaviors;
use crate::error::{OrmError, Result};
use crate::model::ModelRef;
use crate::record::Record;
use indexmap::IndexMap;
use sea_query::Value;
use std::sync::Arc;

/// Flat result row: column alias -> value
pub type Row = IndexMap<String, Value>;

#[derive(Debug, Clone)]
struct HydrationEntry {
    model: ModelRef,
    behaviors: Arc<Behaviors>,
    /// Row key -> property
    columns: IndexMap<String, String>,
    defaults: IndexMap<String, Value>,
}

impl HydrationEntry {
    fn new(model: ModelRef, behaviors: Arc<Behaviors>, columns: IndexMap<String, String>) -> Self {
        let defaults = model.defaults();
        Self {
            model,
            behaviors,
            columns,
            defaults,
        }
    }

    fn populate(&self, row: &Row, record: &mut Record) -> Result<()> {
        for (row_key, property) in &self.columns {
            if let Some(value) = row.get(row_key) {
                let value = self.behaviors.retrieve_property(value.clone(), property)?;
                record.set(property, value);
            }
        }
        for (property, value) in &self.defaults {
            if !record.has(property) {
                record.set(property, value.clone());
            }
        }
        Ok(())
    }
}

/// Maps flat rows into nested records
#[derive(Debug, Clone)]
pub struct Hydrator {
    base: HydrationEntry,
    /// Relation path (relative to the base model) -> entry, parents first
    entries: IndexMap<String, HydrationEntry>,
}

impl Hydrator {
    pub fn new(model: ModelRef, behaviors: Arc<Behaviors>) -> Self {
        Self {
            base: HydrationEntry::new(model, behaviors, IndexMap::new()),
            entries: IndexMap::new(),
        }
    }

    /// Map a row key onto a base model property
    pub fn map_column(&mut self, row_key: impl Into<String>, property: impl Into<String>) -> &mut Self {
        self.base.columns.insert(row_key.into(), property.into());
        self
    }

    /// Register a nested record for the relation path `path`
    ///
    /// The parent path must already be registered. Registering the same path
    /// twice is a [`Conflict`](crate::ErrorKind::Conflict).
    pub fn add(
        &mut self,
        path: &str,
        model: ModelRef,
        behaviors: Arc<Behaviors>,
        columns: IndexMap<String, String>,
    ) -> Result<()> {
        if self.entries.contains_key(path) {
            return Err(OrmError::DuplicateHydrationRule(path.to_owned()));
        }
        if let Some((parent, _)) = path.rsplit_once('.') {
            if !self.entries.contains_key(parent) {
                return Err(OrmError::InvalidModel(format!(
                    "hydration rule for '{}' registered before its parent '{}'",
                    path, parent
                )));
            }
        }
        self.entries
            .insert(path.to_owned(), HydrationEntry::new(model, behaviors, columns));
        Ok(())
    }

    /// Relation paths with a hydration rule, parents first
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Hydrate a row into a fresh record of the base model
    pub fn hydrate(&self, row: &Row) -> Result<Record> {
        let mut record = Record::for_model(&self.base.model);
        self.hydrate_into(row, &mut record)?;
        Ok(record)
    }

    /// Hydrate a row into `target`
    pub fn hydrate_into(&self, row: &Row, target: &mut Record) -> Result<()> {
        self.base.populate(row, target)?;

        for (path, entry) in &self.entries {
            let mut related = Record::for_model(&entry.model);
            entry.populate(row, &mut related)?;

            let (parent, name) = match path.rsplit_once('.') {
                Some((parent, name)) => (target.related_path_mut(parent), name),
                None => (Some(&mut *target), path.as_str()),
            };
            if let Some(parent) = parent {
                parent.set_related(name, related);
            }
        }
        Ok(())
    }
}
