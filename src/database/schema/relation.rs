/// A declared many-to-one relationship between two entities.
///
/// `column` lives on the owning entity and references `target_column` on the
/// `target` entity, i.e. `owner.column = target.target_column`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub name: String,
    pub target: String,
    pub column: String,
    pub target_column: String,
}

impl Relation {
    pub fn new(name: &str, target: &str, column: &str, target_column: &str) -> Self {
        Self {
            name: name.to_string(),
            target: target.to_string(),
            column: column.to_string(),
            target_column: target_column.to_string(),
        }
    }
}
