//! Helper functions for relationship operations.
//!
//! Join conditions and alias-qualified column references.

use crate::relation::identity::Identity;
use sea_query::{Alias, Condition, Expr, ExprTrait};

/// Owned SQL identifier
pub(crate) fn ident(name: &str) -> Alias {
    Alias::new(name.to_owned())
}

/// Column reference qualified by a table alias: `"alias"."column"`
pub fn qualified_col(table_alias: &str, column: &str) -> Expr {
    Expr::col((ident(table_alias), ident(column)))
}

/// Build the ON condition of a relation join
///
/// Pairs each foreign key column on the child with the candidate key column
/// at the same position on the parent:
/// `child.fk_1 = parent.ck_1 AND child.fk_2 = parent.ck_2 ...`
///
/// Callers validate that both keys have the same arity.
pub fn join_on_condition(
    child_alias: &str,
    foreign_key: &Identity,
    parent_alias: &str,
    candidate_key: &Identity,
) -> Condition {
    foreign_key
        .iter()
        .zip(candidate_key.iter())
        .fold(Condition::all(), |condition, (fk_col, ck_col)| {
            condition.add(qualified_col(child_alias, fk_col).eq(qualified_col(parent_alias, ck_col)))
        })
}
