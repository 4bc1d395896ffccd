use serde::{Deserialize, Serialize};

/// Strategy used for generating row ids in a table.
///
/// - `Uuid`: use UUID strings for the row id.
/// - `Int`: use incrementing integers for the row id.
/// - `None`: no automatic id generation; callers must provide an id in the row.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IdType {
    Uuid,
    /// Integer ids generated sequentially (default).
    #[default]
    Int,
    None,
}
