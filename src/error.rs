//! Error types for relation resolution, query assembly and hydration.
//!
//! Every fallible operation in this crate returns [`OrmError`]. Errors are local
//! to the resolve/assemble/hydrate call that raised them; there is no partial
//! success and nothing is retried.

use thiserror::Error;

/// Broad classification of an [`OrmError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unknown relation, column or property
    NotFound,
    /// Duplicate registration (relation name, hydration path)
    Conflict,
    /// A behavior was handed a value it cannot transform
    TypeMismatch,
    /// Structurally invalid model metadata or configuration
    Invalid,
}

/// Error type for all undertow operations
#[derive(Debug, Error)]
pub enum OrmError {
    /// The relation name is not registered on the model
    #[error("Relation '{relation}' not found on model '{table}'")]
    RelationNotFound { table: String, relation: String },

    /// The column is neither a key column nor a declared column of the model
    #[error("Column '{column}' not found on model '{table}'")]
    ColumnNotFound { table: String, column: String },

    /// The property is not stored on the record
    #[error("Property '{property}' not found on record '{table}'")]
    PropertyNotFound { table: String, property: String },

    /// A relation with the same name is already registered
    #[error("Relation '{relation}' is already defined on model '{table}'")]
    DuplicateRelation { table: String, relation: String },

    /// A hydration rule for the path already exists
    #[error("Hydration rule for path '{0}' is already defined")]
    DuplicateHydrationRule(String),

    /// A behavior received a value type it cannot transform
    #[error("{behavior} cannot transform '{key}': expected {expected}, got {actual}")]
    TypeMismatch {
        behavior: &'static str,
        key: String,
        expected: &'static str,
        actual: String,
    },

    /// Candidate and foreign key of a relation have different column counts
    #[error("Relation '{relation}' pairs {candidate} candidate key column(s) with {foreign} foreign key column(s)")]
    KeyArityMismatch {
        relation: String,
        candidate: usize,
        foreign: usize,
    },

    /// Model metadata cannot be used as declared
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl OrmError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrmError::RelationNotFound { .. }
            | OrmError::ColumnNotFound { .. }
            | OrmError::PropertyNotFound { .. } => ErrorKind::NotFound,
            OrmError::DuplicateRelation { .. } | OrmError::DuplicateHydrationRule(_) => {
                ErrorKind::Conflict
            }
            OrmError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            OrmError::KeyArityMismatch { .. } | OrmError::InvalidModel(_) | OrmError::Config(_) => {
                ErrorKind::Invalid
            }
        }
    }

    pub(crate) fn relation_not_found(table: &str, relation: &str) -> Self {
        OrmError::RelationNotFound {
            table: table.to_owned(),
            relation: relation.to_owned(),
        }
    }

    pub(crate) fn column_not_found(table: &str, column: &str) -> Self {
        OrmError::ColumnNotFound {
            table: table.to_owned(),
            column: column.to_owned(),
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T, E = OrmError> = std::result::Result<T, E>;
