use std::error::Error as StdError;

use thiserror::Error;

use crate::database::ValueType;

/// Errors raised while building, translating, executing or mapping a query.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("type mismatch in {context}: expected {expected:?}, found {found:?}")]
    TypeMismatch { context: String, expected: ValueType, found: ValueType },

    #[error("alias `{0}` is bound more than once")]
    AmbiguousAlias(String),

    #[error("alias `{0}` is not bound by this query or any enclosing query")]
    UnboundAlias(String),

    #[error("unknown entity `{0}`")]
    UnknownEntity(String),

    #[error("entity `{entity}` has no field `{field}`")]
    UnknownField { entity: String, field: String },

    #[error("entity `{entity}` has no relation `{relation}`")]
    UnknownRelation { entity: String, relation: String },

    #[error("invalid join: {0}")]
    InvalidJoin(String),

    #[error("`{0}` must follow a join clause")]
    MisplacedClause(&'static str),

    #[error("query has no source entity")]
    MissingSource,

    #[error("projection into `{shape}` cannot be resolved: {detail}")]
    UnresolvedProjectionField { shape: &'static str, detail: String },

    #[error("expected at most one row, got {0}")]
    NonUniqueResult(usize),

    #[error("result mapping failed: {0}")]
    Mapping(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl QueryError {
    pub fn type_mismatch(context: impl Into<String>, expected: ValueType, found: ValueType) -> Self {
        Self::TypeMismatch { context: context.into(), expected, found }
    }

    pub fn mapping(message: impl Into<String>) -> Self {
        Self::Mapping(message.into())
    }
}

/// Opaque failure of a data source round trip. Never retried by this crate.
#[derive(Debug, Error)]
#[error("transport error: {message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), source: None }
    }

    pub fn with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self { message: message.into(), source: Some(Box::new(source)) }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_keeps_its_source() {
        let io = std::io::Error::other("socket closed");
        let err = TransportError::with_source("round trip failed", io);
        assert_eq!(err.message(), "round trip failed");
        assert!(err.source().is_some());

        let q: QueryError = err.into();
        assert!(matches!(q, QueryError::Transport(_)));
        assert_eq!(q.to_string(), "transport error: round trip failed");
    }

    #[test]
    fn type_mismatch_message_names_both_types() {
        let err = QueryError::type_mismatch("member.age", ValueType::Int, ValueType::String);
        let msg = err.to_string();
        assert!(msg.contains("member.age"));
        assert!(msg.contains("Int"));
        assert!(msg.contains("String"));
    }
}
