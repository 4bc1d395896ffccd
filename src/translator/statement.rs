use std::{fmt, sync::Arc};

use serde_json::Value;

use crate::query::QueryDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// Rows of the select list.
    Select,
    /// A single row holding the number of rows the query yields without its window.
    Count,
}

/// Rendered SQL with its ordered parameters. The originating descriptor rides
/// along for transports that evaluate queries natively.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
    pub kind: StatementKind,
    pub descriptor: Arc<QueryDescriptor>,
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql)
    }
}
