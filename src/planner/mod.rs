//! Lowers query descriptors into logical plans for the in-memory engine.

pub mod aggregate_call;
pub use aggregate_call::*;

pub mod logical_plan;
pub use logical_plan::*;

pub mod plan_builder;
pub use plan_builder::*;
