use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::{
    error::QueryError,
    expr::SqlType,
    mapper::{Entity, Related, Tuple, TupleValue},
    query::{EntitySlot, Projection, QueryDescriptor, SelectItem, SelectLayout, Shape, Slot},
};

/// A row shaped after the projection, before conversion to the caller's type.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Value(Value),
    Entity(Option<Entity>),
    Tuple(Tuple),
    /// Field name and value for each bound select item, in select order.
    Shape(Vec<(&'static str, Value)>),
}

enum Target {
    Single,
    Tuple(Arc<[SelectItem]>),
    Shape(Vec<Option<&'static str>>),
}

/// Turns flat rows into [`Record`]s following a query's select layout.
pub struct ResultMapper {
    layout: SelectLayout,
    target: Target,
}

impl ResultMapper {
    pub fn new(descriptor: &QueryDescriptor) -> Self {
        let layout = SelectLayout::of(descriptor);
        let target = match &descriptor.projection {
            Projection::Default | Projection::Single(_) => Target::Single,
            Projection::Tuple(items) => Target::Tuple(items.clone().into()),
            Projection::Shape { targets, .. } => Target::Shape(targets.clone()),
        };
        Self { layout, target }
    }

    pub fn layout(&self) -> &SelectLayout {
        &self.layout
    }

    pub fn map_row(&self, row: &[Value]) -> Result<Record, QueryError> {
        if row.len() != self.layout.width() {
            return Err(QueryError::mapping(format!(
                "row has {} columns, select list has {}",
                row.len(),
                self.layout.width()
            )));
        }
        match &self.target {
            Target::Single => match self.layout.slots.first() {
                Some(Slot::Value(i)) => Ok(Record::Value(row[*i].clone())),
                Some(Slot::Entity(slot)) => Ok(Record::Entity(Self::map_entity(slot, row))),
                None => Err(QueryError::mapping("empty select list")),
            },
            Target::Tuple(items) => {
                let values = self.layout.slots.iter()
                    .map(|slot| match slot {
                        Slot::Value(i) => TupleValue::Value(row[*i].clone()),
                        Slot::Entity(slot) => TupleValue::Entity(Self::map_entity(slot, row)),
                    })
                    .collect();
                Ok(Record::Tuple(Tuple::new(Arc::clone(items), values)))
            }
            Target::Shape(fields) => {
                let assignments = self.layout.slots.iter().zip(fields)
                    .filter_map(|(slot, field)| match (slot, field) {
                        (Slot::Value(i), Some(name)) => Some((*name, row[*i].clone())),
                        _ => None,
                    })
                    .collect();
                Ok(Record::Shape(assignments))
            }
        }
    }

    /// Entity whose id column is null (outer join miss) maps to `None`.
    fn map_entity(slot: &EntitySlot, row: &[Value]) -> Option<Entity> {
        let schema = slot.path.schema();
        let values: IndexMap<String, Value> = schema.fields.keys()
            .enumerate()
            .map(|(offset, name)| (name.clone(), row[slot.start + offset].clone()))
            .collect();
        if values.get(&schema.id_key).is_none_or(Value::is_null) {
            return None;
        }

        let relations = schema.relations.values()
            .map(|rel| {
                let related = match slot.fetched.iter().find(|(name, _)| name == &rel.name) {
                    Some((_, fetched)) => Related::Loaded(Self::map_entity(fetched, row).map(Box::new)),
                    None => match values.get(&rel.column) {
                        Some(key) if !key.is_null() => Related::Deferred { entity: rel.target.clone(), key: key.clone() },
                        _ => Related::Loaded(None),
                    },
                };
                (rel.name.clone(), related)
            })
            .collect();

        Some(Entity { name: schema.name.clone(), values, relations })
    }
}

pub(crate) fn to_scalar<T: SqlType>(record: Record) -> Result<Option<T>, QueryError> {
    match record {
        Record::Value(Value::Null) => Ok(None),
        Record::Value(v) => T::from_value(&v).map(Some),
        other => Err(QueryError::mapping(format!("expected a scalar, got {:?}", other))),
    }
}

pub(crate) fn to_entity(record: Record) -> Result<Entity, QueryError> {
    match record {
        Record::Entity(Some(e)) => Ok(e),
        Record::Entity(None) => Err(QueryError::mapping("primary entity row has a null id")),
        other => Err(QueryError::mapping(format!("expected an entity, got {:?}", other))),
    }
}

pub(crate) fn to_optional_entity(record: Record) -> Result<Option<Entity>, QueryError> {
    match record {
        Record::Entity(e) => Ok(e),
        other => Err(QueryError::mapping(format!("expected an entity, got {:?}", other))),
    }
}

pub(crate) fn to_tuple(record: Record) -> Result<Tuple, QueryError> {
    match record {
        Record::Tuple(t) => Ok(t),
        other => Err(QueryError::mapping(format!("expected a tuple, got {:?}", other))),
    }
}

pub(crate) fn to_shape<S: Shape>(record: Record) -> Result<S, QueryError> {
    match record {
        Record::Shape(assignments) => {
            let mut shape = S::default();
            for (field, value) in &assignments {
                shape.assign(field, value)?;
            }
            Ok(shape)
        }
        other => Err(QueryError::mapping(format!("expected a {} row, got {:?}", S::NAME, other))),
    }
}
