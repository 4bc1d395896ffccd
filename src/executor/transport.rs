use serde_json::Value;

use crate::{error::TransportError, translator::Statement};

/// Rows returned by a data source, each an ordered value sequence matching
/// the statement's select list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub rows: Vec<Vec<Value>>,
    /// Row count reported by the source for count statements, when known.
    pub total: Option<u64>,
}

impl RowSet {
    pub fn new(rows: Vec<Vec<Value>>) -> Self {
        Self { rows, total: None }
    }

    pub fn counted(total: u64) -> Self {
        Self { rows: vec![vec![Value::from(total)]], total: Some(total) }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One synchronous round trip to a data source.
pub trait Transport {
    fn execute(&self, statement: &Statement) -> Result<RowSet, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, statement: &Statement) -> Result<RowSet, TransportError> {
        (**self).execute(statement)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, statement: &Statement) -> Result<RowSet, TransportError> {
        (**self).execute(statement)
    }
}
