//! Projected columns

use sea_query::Expr;

/// One entry of a query's explicit projection
#[derive(Debug, Clone, PartialEq)]
pub enum SelectColumn {
    /// Column path, aliased by the projection rules
    Path(String),
    /// Column path under an explicit alias
    Aliased { alias: String, path: String },
    /// Arbitrary expression under an alias
    Expression { alias: String, expr: Expr },
    /// Every column of the base table
    Asterisk,
}

impl SelectColumn {
    pub fn aliased(alias: impl Into<String>, path: impl Into<String>) -> Self {
        SelectColumn::Aliased {
            alias: alias.into(),
            path: path.into(),
        }
    }

    pub fn expression(alias: impl Into<String>, expr: Expr) -> Self {
        SelectColumn::Expression {
            alias: alias.into(),
            expr,
        }
    }

    /// Same column projected under `alias`
    pub(crate) fn realiased(&self, alias: &str) -> Option<SelectColumn> {
        match self {
            SelectColumn::Path(path) | SelectColumn::Aliased { path, .. } => {
                Some(SelectColumn::aliased(alias, path.clone()))
            }
            SelectColumn::Expression { expr, .. } => Some(SelectColumn::expression(alias, expr.clone())),
            SelectColumn::Asterisk => None,
        }
    }
}

impl From<&str> for SelectColumn {
    fn from(path: &str) -> Self {
        if path == "*" {
            SelectColumn::Asterisk
        } else {
            SelectColumn::Path(path.to_owned())
        }
    }
}

impl From<String> for SelectColumn {
    fn from(path: String) -> Self {
        SelectColumn::from(path.as_str())
    }
}
