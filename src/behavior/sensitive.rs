use crate::behavior::{Behavior, RewriteBehavior, RewriteContext};
use sea_query::Expr;

const DEFAULT_PLACEHOLDER: &str = "***";

/// Replaces the SQL expression of sensitive columns with a literal placeholder
///
/// Projections and filters see the placeholder, never the stored value.
#[derive(Debug, Clone)]
pub struct Sensitive {
    columns: Vec<String>,
    placeholder: String,
}

impl Sensitive {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_placeholder(columns, DEFAULT_PLACEHOLDER)
    }

    pub fn with_placeholder<I, S>(columns: I, placeholder: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            placeholder: placeholder.to_owned(),
        }
    }
}

impl RewriteBehavior for Sensitive {
    fn rewrite_column(&self, column: &str, _context: &RewriteContext<'_>) -> Option<Expr> {
        self.columns
            .iter()
            .any(|c| c == column)
            .then(|| Expr::val(self.placeholder.clone()))
    }
}

impl Behavior for Sensitive {
    fn name(&self) -> &'static str {
        "sensitive"
    }

    fn as_rewrite(&self) -> Option<&dyn RewriteBehavior> {
        Some(self)
    }
}
