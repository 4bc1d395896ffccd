use serde::{Deserialize, Serialize};

use crate::translator::Dialect;

/// Executor configuration.
///
/// - `dialect` selects the placeholder style of rendered SQL.
/// - `warn_row_threshold` logs a warning when a result has more rows.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub dialect: Dialect,
    pub warn_row_threshold: Option<usize>,
}

impl QueryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn warn_row_threshold(mut self, rows: usize) -> Self {
        self.warn_row_threshold = Some(rows);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
