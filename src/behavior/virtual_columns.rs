use crate::behavior::{Behavior, RewriteBehavior};
use indexmap::IndexMap;

/// Columns that stand for another path of the model
///
/// ```
/// use undertow::behavior::VirtualColumns;
///
/// let columns = VirtualColumns::new().map("office_city", "office.city");
/// ```
#[derive(Debug, Clone, Default)]
pub struct VirtualColumns {
    paths: IndexMap<String, String>,
}

impl VirtualColumns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `column` as `path`, relative to the owning model
    pub fn map(mut self, column: &str, path: &str) -> Self {
        self.paths.insert(column.to_owned(), path.to_owned());
        self
    }
}

impl RewriteBehavior for VirtualColumns {
    fn rewrite_path(&self, column: &str) -> Option<String> {
        self.paths.get(column).cloned()
    }
}

impl Behavior for VirtualColumns {
    fn name(&self) -> &'static str {
        "virtual_columns"
    }

    fn as_rewrite(&self) -> Option<&dyn RewriteBehavior> {
        Some(self)
    }
}
