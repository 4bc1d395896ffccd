use std::sync::Arc;

use serde_json::Value;

use crate::{
    error::QueryError,
    expr::{Expression, SqlType},
    mapper::Entity,
    query::{EntityPath, SelectItem, SelectTarget},
};

#[derive(Debug, Clone, PartialEq)]
pub enum TupleValue {
    Value(Value),
    Entity(Option<Entity>),
}

/// One result row of a multi-item select, addressable by select expression,
/// alias, entity path or position.
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    items: Arc<[SelectItem]>,
    values: Vec<TupleValue>,
}

fn read<T: SqlType>(value: Option<&TupleValue>) -> Result<Option<T>, QueryError> {
    match value {
        Some(TupleValue::Value(Value::Null)) => Ok(None),
        Some(TupleValue::Value(v)) => T::from_value(v).map(Some),
        Some(TupleValue::Entity(_)) => Err(QueryError::mapping("tuple element is an entity, not a value")),
        None => Err(QueryError::mapping("no such tuple element")),
    }
}

impl Tuple {
    pub(crate) fn new(items: Arc<[SelectItem]>, values: Vec<TupleValue>) -> Self {
        Self { items, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn position_of(&self, expr: &Expression<impl SqlType>) -> Option<usize> {
        self.items.iter().position(|i| matches!(&i.target, SelectTarget::Expr(e) if e == expr.expr()))
    }

    /// Value of the element selected by `expr` (structural match).
    pub fn get<T: SqlType>(&self, expr: &Expression<T>) -> Result<Option<T>, QueryError> {
        let idx = self.position_of(expr)
            .ok_or_else(|| QueryError::mapping(format!("{:?} is not part of the select list", expr)))?;
        read(self.values.get(idx))
    }

    pub fn get_by_alias<T: SqlType>(&self, alias: &str) -> Result<Option<T>, QueryError> {
        let idx = self.items.iter().position(|i| i.alias.as_deref() == Some(alias))
            .ok_or_else(|| QueryError::mapping(format!("no tuple element named `{}`", alias)))?;
        read(self.values.get(idx))
    }

    pub fn get_at<T: SqlType>(&self, index: usize) -> Result<Option<T>, QueryError> {
        read(self.values.get(index))
    }

    pub fn value_at(&self, index: usize) -> Option<&TupleValue> {
        self.values.get(index)
    }

    /// The entity selected under `path`'s alias; `None` when it was not
    /// selected or came back null from an outer join.
    pub fn entity(&self, path: &EntityPath) -> Option<&Entity> {
        let idx = self.items.iter().position(|i| matches!(&i.target, SelectTarget::Entity(p) if p == path))?;
        match self.values.get(idx) {
            Some(TupleValue::Entity(e)) => e.as_ref(),
            _ => None,
        }
    }
}
