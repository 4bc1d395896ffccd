use serde_json::Value;
use thiserror::Error;

use crate::{
    database::DbError,
    error::{QueryError, TransportError},
};

/// Failures while the in-memory engine evaluates a plan.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("cannot plan subquery")]
    Plan(#[source] Box<QueryError>),

    #[error("invalid LIKE pattern")]
    Pattern(#[from] regex::Error),

    #[error("scalar subquery returned {0} rows")]
    ScalarSubqueryRows(usize),

    #[error("division by zero")]
    DivisionByZero,

    #[error("aggregate `{0}` is not registered")]
    UnknownAggregate(String),

    #[error("aggregate `{0}` evaluated outside of a group")]
    UngroupedAggregate(String),

    #[error("{func} cannot accumulate {value}")]
    AggregateArgument { func: &'static str, value: Value },

    #[error("`{op}` cannot be applied to {left} and {right}")]
    Operand { op: String, left: Value, right: Value },
}

impl EngineError {
    pub fn operand(op: impl ToString, left: &Value, right: &Value) -> Self {
        Self::Operand { op: op.to_string(), left: left.clone(), right: right.clone() }
    }
}

impl From<EngineError> for TransportError {
    fn from(e: EngineError) -> Self {
        TransportError::with_source("in-memory engine failed", e)
    }
}
