//! Hydrated records
//!
//! A [`Record`] is the object a result row is hydrated into: ordered
//! properties, nested records for eager-loaded relations, and the computed
//! accessors its model declares.

use crate::error::{OrmError, Result};
use crate::model::{Accessor, ModelRef};
use crate::value;
use indexmap::IndexMap;
use sea_query::Value;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

#[derive(Clone, Default)]
pub struct Record {
    table: String,
    properties: IndexMap<String, Value>,
    related: IndexMap<String, Record>,
    accessors: Vec<(&'static str, Accessor)>,
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("table", &self.table)
            .field("properties", &self.properties)
            .field("related", &self.related)
            .finish()
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.table == other.table && self.properties == other.properties && self.related == other.related
    }
}

impl Record {
    /// Empty record without accessors
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    /// Empty record carrying the accessors declared by `model`
    pub fn for_model(model: &ModelRef) -> Self {
        Self {
            table: model.table_name().to_owned(),
            accessors: model.accessors(),
            ..Default::default()
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Stored property
    pub fn get(&self, key: &str) -> Result<&Value> {
        self.properties.get(key).ok_or_else(|| OrmError::PropertyNotFound {
            table: self.table.clone(),
            property: key.to_owned(),
        })
    }

    pub fn get_opt(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Stored property, or the value of a computed accessor
    pub fn value(&self, key: &str) -> Result<Value> {
        if let Some(value) = self.properties.get(key) {
            return Ok(value.clone());
        }
        match self.accessors.iter().find(|(name, _)| *name == key) {
            Some((_, accessor)) => Ok(accessor(self).unwrap_or_else(value::null)),
            None => Err(OrmError::PropertyNotFound {
                table: self.table.clone(),
                property: key.to_owned(),
            }),
        }
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.properties.insert(key.to_owned(), value.into());
        self
    }

    pub fn has(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn property_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.properties.get_mut(key)
    }

    /// Stored property names in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    pub fn properties(&self) -> &IndexMap<String, Value> {
        &self.properties
    }

    pub fn related(&self, name: &str) -> Option<&Record> {
        self.related.get(name)
    }

    pub fn set_related(&mut self, name: &str, record: Record) -> &mut Self {
        self.related.insert(name.to_owned(), record);
        self
    }

    /// Nested record at a dotted relation path (`audit.user`)
    pub fn related_path(&self, path: &str) -> Option<&Record> {
        path.split('.').try_fold(self, |record, name| record.related.get(name))
    }

    pub fn related_path_mut(&mut self, path: &str) -> Option<&mut Record> {
        path.split('.')
            .try_fold(self, |record, name| record.related.get_mut(name))
    }

    /// Render as JSON
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (key, value) in &self.properties {
            map.serialize_entry(key, &value::to_json(value))?;
        }
        for (name, accessor) in &self.accessors {
            if !self.properties.contains_key(*name) {
                let computed = accessor(self).unwrap_or_else(value::null);
                map.serialize_entry(name, &value::to_json(&computed))?;
            }
        }
        for (name, record) in &self.related {
            map.serialize_entry(name, record)?;
        }
        map.end()
    }
}
