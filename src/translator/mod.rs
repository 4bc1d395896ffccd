//! Lowers query descriptors into SQL text plus ordered parameters.

pub mod dialect;
pub use dialect::*;

pub mod statement;
pub use statement::*;

pub mod sql_writer;
pub use sql_writer::*;

pub mod query_rendering;
pub use query_rendering::*;
