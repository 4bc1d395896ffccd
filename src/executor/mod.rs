//! Execution: the transport seam, the query executor and the in-memory
//! reference engine behind [`MemoryTransport`].

pub mod engine_error;
pub use engine_error::*;

pub mod helpers;
pub use helpers::*;

pub mod aggregators;

pub mod eval;
pub use eval::*;

pub mod plan_executor;
pub use plan_executor::*;

pub mod transport;
pub use transport::*;

pub mod memory;
pub use memory::*;

pub mod results;
pub use results::*;

pub mod query_executor;
pub use query_executor::*;
