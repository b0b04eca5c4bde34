//! Relation module for model relationships.
//!
//! - has_one: to-one, foreign key on the target
//! - belongs_to: to-one, foreign key on the source
//! - has_many: to-many, foreign key on the target
//! - belongs_to_many: many-to-many through a junction table or model
//!
//! # Architecture
//!
//! - **Identity**: single and composite key columns
//! - **Def**: `Relation`, `RelationKind` and key resolution into `RelationEdge`s
//! - **Relations**: the per-model directory of named relations
//! - **Helpers**: join conditions

pub mod identity;
#[doc(inline)]
pub use identity::{BorrowedIdentityIter, Identity, IntoIdentity};

pub mod def;
#[doc(inline)]
pub use def::{Relation, RelationEdge, RelationKind, Through};

pub mod relations;
#[doc(inline)]
pub use relations::Relations;

pub mod helpers;
#[doc(inline)]
pub use helpers::{join_on_condition, qualified_col};
