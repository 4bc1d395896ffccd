pub mod error;
pub use error::{QueryError, TransportError};

pub mod config;
pub use config::QueryConfig;

pub mod database;
pub use database::{Db, DbCommon, DbConfig, EntitySchema, IdType, Schema, ValueType};

pub mod expr;
pub mod query;
pub mod planner;
pub mod translator;
pub mod mapper;

pub mod executor;
pub use executor::{Executor, MemoryTransport, QueryResults, RowSet, Transport};
