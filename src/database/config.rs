use serde::{Deserialize, Serialize};

use crate::database::IdType;

/// Table configuration used when creating tables.
///
/// - `id_type` controls how row ids are generated.
/// - `id_key` is the column holding the row id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub id_type: IdType,
    pub id_key: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self { id_type: Default::default(), id_key: "id".to_string() }
    }
}

impl DbConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(id_type: IdType, id_key: &str) -> Self {
        Self { id_type, id_key: id_key.to_string() }
    }

    pub fn int(id_key: &str) -> Self {
        Self::from(IdType::Int, id_key)
    }

    pub fn uuid(id_key: &str) -> Self {
        Self::from(IdType::Uuid, id_key)
    }

    /// No id generation; rows must carry `id_key` themselves.
    pub fn none(id_key: &str) -> Self {
        Self::from(IdType::None, id_key)
    }
}
