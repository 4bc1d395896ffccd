use serde_json::Value;
use uuid::Uuid;

use crate::database::{DbError, IdType};

/// Hands out the next id for a table and tracks the highest integer id seen
/// so that rows loaded with explicit ids do not collide with generated ones.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct IdManager {
    pub id_type: IdType,
    current: Option<u64>,
}

impl IdManager {
    pub fn new(id_type: IdType) -> Self {
        Self { id_type, current: None }
    }

    pub fn current(&self) -> Option<u64> {
        self.current
    }

    /// Record an explicitly provided id. Integer ids move the counter forward.
    pub fn observe(&mut self, id: &Value) -> Result<(), DbError> {
        match (self.id_type, id) {
            (IdType::Int, Value::Number(n)) => {
                let n = n.as_u64().ok_or_else(|| DbError::InvalidId(id.to_string()))?;
                if self.current.is_none_or(|current| current < n) {
                    self.current = Some(n);
                }
                Ok(())
            }
            (IdType::Uuid, Value::String(s)) => Uuid::parse_str(s)
                .map(|_| ())
                .map_err(|_| DbError::InvalidId(s.clone())),
            (IdType::None, Value::Number(_) | Value::String(_)) => Ok(()),
            _ => Err(DbError::InvalidId(id.to_string())),
        }
    }
}

impl Iterator for IdManager {
    type Item = Value;

    fn next(&mut self) -> Option<Self::Item> {
        match self.id_type {
            IdType::Int => {
                let next = self.current.map_or(1, |id| id.saturating_add(1));
                self.current = Some(next);
                Some(Value::from(next))
            }
            IdType::Uuid => Some(Value::String(Uuid::new_v4().to_string())),
            IdType::None => None,
        }
    }
}
