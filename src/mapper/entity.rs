use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::{error::QueryError, expr::SqlType};

/// A related entity as seen from its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum Related {
    /// Materialised in the same round trip (fetch join). `None` when the
    /// reference is null or the outer join found nothing.
    Loaded(Option<Box<Entity>>),
    /// Not loaded; `key` identifies the row of `entity` to fetch later.
    Deferred { entity: String, key: Value },
}

/// A mapped entity row: every schema field in declaration order plus its
/// declared relations.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub name: String,
    pub values: IndexMap<String, Value>,
    pub relations: IndexMap<String, Related>,
}

impl Entity {
    pub fn value(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Typed field read; `Ok(None)` for null.
    pub fn get<T: SqlType>(&self, field: &str) -> Result<Option<T>, QueryError> {
        match self.values.get(field) {
            None => Err(QueryError::UnknownField { entity: self.name.clone(), field: field.to_string() }),
            Some(Value::Null) => Ok(None),
            Some(v) => T::from_value(v).map(Some),
        }
    }

    pub fn related(&self, relation: &str) -> Option<&Related> {
        self.relations.get(relation)
    }

    pub fn is_loaded(&self, relation: &str) -> bool {
        matches!(self.relations.get(relation), Some(Related::Loaded(_)))
    }

    /// The fetched entity behind `relation`, if it was loaded and present.
    pub fn loaded(&self, relation: &str) -> Option<&Entity> {
        match self.relations.get(relation) {
            Some(Related::Loaded(Some(e))) => Some(e),
            _ => None,
        }
    }

    /// JSON object of the field values, with loaded relations nested.
    pub fn to_json(&self) -> Value {
        let mut map: Map<String, Value> = self.values.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        for (name, related) in &self.relations {
            if let Related::Loaded(e) = related {
                map.insert(name.clone(), e.as_ref().map_or(Value::Null, |e| e.to_json()));
            }
        }
        Value::Object(map)
    }
}
