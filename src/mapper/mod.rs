//! Shapes flat result rows into scalars, tuples, entities and user shapes.

pub mod entity;
pub use entity::*;

pub mod tuple;
pub use tuple::*;

pub mod result_mapper;
pub use result_mapper::*;
