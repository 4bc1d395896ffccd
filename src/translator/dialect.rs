use serde::{Deserialize, Serialize};

/// Placeholder style of the target database. Dialects differ only in
/// placeholders; every other construct renders the same ANSI form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// `?` placeholders.
    ///
    /// Concatenation renders as `||` and a window without a limit renders a
    /// bare `OFFSET n`. Databases that treat `||` as logical or, or that
    /// require `LIMIT` before `OFFSET` (MySQL, SQLite), will reject or
    /// misread such statements.
    #[default]
    Generic,
    /// `$1`, `$2`, ... placeholders.
    Postgres,
}

impl Dialect {
    /// Placeholder for the parameter at 1-based `position`.
    pub fn placeholder(self, position: usize) -> String {
        match self {
            Dialect::Generic => "?".to_string(),
            Dialect::Postgres => format!("${}", position),
        }
    }
}
