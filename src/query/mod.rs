//! Query descriptors and the fluent builder that produces them.

pub mod entity_path;
pub use entity_path::*;

pub mod descriptor;
pub use descriptor::*;

pub mod layout;
pub use layout::*;

pub mod projections;
pub use projections::*;

pub mod builder;
pub use builder::*;
