//! Identity enum for representing single and composite key columns
//!
//! Primary keys, candidate keys and foreign keys may consist of one or more
//! columns. `Identity` holds the column names in declaration order.

use std::fmt;

/// Represents a key made of one or more columns
///
/// # Example
///
/// ```
/// use undertow::Identity;
///
/// let id: Identity = "id".into();
/// assert_eq!(id.arity(), 1);
///
/// let composite: Identity = vec!["car_id", "user_id"].into();
/// assert_eq!(composite, Identity::Binary("car_id".into(), "user_id".into()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    /// Single column
    Unary(String),
    /// Two columns
    Binary(String, String),
    /// Three columns
    Ternary(String, String, String),
    /// Four or more columns
    Many(Vec<String>),
}

impl Identity {
    /// Build an identity from columns, picking the smallest fitting variant
    pub fn from_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        match columns.len() {
            1 => Identity::Unary(columns.remove(0)),
            2 => {
                let second = columns.remove(1);
                Identity::Binary(columns.remove(0), second)
            }
            3 => {
                let third = columns.remove(2);
                let second = columns.remove(1);
                Identity::Ternary(columns.remove(0), second, third)
            }
            _ => Identity::Many(columns),
        }
    }

    /// Number of columns
    pub fn arity(&self) -> usize {
        match self {
            Self::Unary(_) => 1,
            Self::Binary(_, _) => 2,
            Self::Ternary(_, _, _) => 3,
            Self::Many(vec) => vec.len(),
        }
    }

    /// Iterate over column names
    pub fn iter(&self) -> BorrowedIdentityIter<'_> {
        BorrowedIdentityIter {
            identity: self,
            index: 0,
        }
    }

    /// Check if this identity contains a specific column
    pub fn contains(&self, col: &str) -> bool {
        self.iter().any(|c| c == col)
    }

    /// Returns `true` if all columns in `other` are present in `self`
    pub fn fully_contains(&self, other: &Identity) -> bool {
        other.iter().all(|col| self.contains(col))
    }

    /// Prefix every column with `<table>_`, the naming rule for default foreign keys
    pub fn prefixed(&self, table: &str) -> Identity {
        Identity::from_columns(self.iter().map(|col| format!("{}_{}", table, col)))
    }

    /// Column names as an owned list
    pub fn to_vec(&self) -> Vec<String> {
        self.iter().map(str::to_owned).collect()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns: Vec<&str> = self.iter().collect();
        if columns.len() == 1 {
            write!(f, "{}", columns[0])
        } else {
            write!(f, "({})", columns.join(", "))
        }
    }
}

impl From<&str> for Identity {
    fn from(column: &str) -> Self {
        Identity::Unary(column.to_owned())
    }
}

impl From<String> for Identity {
    fn from(column: String) -> Self {
        Identity::Unary(column)
    }
}

impl From<Vec<&str>> for Identity {
    fn from(columns: Vec<&str>) -> Self {
        Identity::from_columns(columns)
    }
}

impl From<Vec<String>> for Identity {
    fn from(columns: Vec<String>) -> Self {
        Identity::from_columns(columns)
    }
}

impl<const N: usize> From<[&str; N]> for Identity {
    fn from(columns: [&str; N]) -> Self {
        Identity::from_columns(columns)
    }
}

/// Iterator over the column names of an `Identity`
#[derive(Debug)]
pub struct BorrowedIdentityIter<'a> {
    identity: &'a Identity,
    index: usize,
}

impl<'a> Iterator for BorrowedIdentityIter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let result = match self.identity {
            Identity::Unary(col1) => {
                if self.index == 0 {
                    Some(col1)
                } else {
                    None
                }
            }
            Identity::Binary(col1, col2) => match self.index {
                0 => Some(col1),
                1 => Some(col2),
                _ => None,
            },
            Identity::Ternary(col1, col2, col3) => match self.index {
                0 => Some(col1),
                1 => Some(col2),
                2 => Some(col3),
                _ => None,
            },
            Identity::Many(vec) => vec.get(self.index),
        };
        if result.is_some() {
            self.index += 1;
        }
        result.map(String::as_str)
    }
}

/// Conversion into an `Identity`
pub trait IntoIdentity {
    fn into_identity(self) -> Identity;
}

impl<T: Into<Identity>> IntoIdentity for T {
    fn into_identity(self) -> Identity {
        self.into()
    }
}
