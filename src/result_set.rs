//! Lazily hydrated query results

use crate::error::Result;
use crate::hydrator::{Hydrator, Row};
use crate::record::Record;
use std::iter::Peekable;

/// Iterator over hydrated records
///
/// Rows are pulled from the underlying iterator one at a time and hydrated
/// when yielded. [`has_result`](ResultSet::has_result) looks one row ahead
/// without consuming it.
pub struct ResultSet<I>
where
    I: Iterator<Item = Row>,
{
    rows: Peekable<I>,
    hydrator: Hydrator,
}

impl<I> ResultSet<I>
where
    I: Iterator<Item = Row>,
{
    pub fn new<R>(rows: R, hydrator: Hydrator) -> Self
    where
        R: IntoIterator<IntoIter = I>,
    {
        Self {
            rows: rows.into_iter().peekable(),
            hydrator,
        }
    }

    /// Whether another row is available
    pub fn has_result(&mut self) -> bool {
        self.rows.peek().is_some()
    }

    pub fn hydrator(&self) -> &Hydrator {
        &self.hydrator
    }
}

impl<I> Iterator for ResultSet<I>
where
    I: Iterator<Item = Row>,
{
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        Some(self.hydrator.hydrate(&row))
    }
}
