use thiserror::Error;

/// Failures of the in-memory data source's storage layer.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("table `{0}` does not exist")]
    UnknownTable(String),

    #[error("invalid row id {0}")]
    InvalidId(String),

    #[error("row has no id under `{0}`")]
    MissingId(String),

    #[error("row is not a JSON object")]
    NotAnObject,

    #[error("column `{table}.{column}` rejects value {value}")]
    InvalidValue { table: String, column: String, value: String },

    #[error("expected a JSON array at the root")]
    NotAnArray,

    #[error("could not read {path}")]
    Io { path: String, #[source] source: std::io::Error },

    #[error("{path} does not contain valid JSON")]
    Json { path: String, #[source] source: serde_json::Error },
}
