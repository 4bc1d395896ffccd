use std::{fmt, hash::{Hash, Hasher}};

use crate::database::ValueType;

/// A field of an aliased entity source. Identity is the alias plus the field
/// name; the type information rides along for validation and mapping.
#[derive(Clone, Eq)]
pub struct Column {
    pub alias: String,
    pub name: String,
    pub ty: ValueType,
    pub nullable: bool,
}

impl Column {
    pub fn new(alias: &str, name: &str, ty: ValueType, nullable: bool) -> Self {
        Self { alias: alias.to_string(), name: name.to_string(), ty, nullable }
    }

    /// Row key used by the in-memory engine, `alias.name`.
    pub fn key(&self) -> String {
        format!("{}.{}", self.alias, self.name)
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.alias == other.alias && self.name == other.name
    }
}

impl Hash for Column {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.alias.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.alias, self.name)
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Column({}: {:?})", self, self.ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn identity_ignores_type_information() {
        let a = Column::new("member", "age", ValueType::Int, false);
        let b = Column::new("member", "age", ValueType::Float, true);
        let c = Column::new("memberSub", "age", ValueType::Int, false);
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<_> = [a.clone(), b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert_eq!(a.key(), "member.age");
    }
}
