pub mod id_type;
pub use id_type::*;

pub mod id_manager;
pub use id_manager::*;

pub mod config;
pub use config::*;

pub mod db_error;
pub use db_error::*;

pub mod table;
pub use table::*;

pub mod db;
pub use db::*;

pub mod schema;
pub use schema::*;
