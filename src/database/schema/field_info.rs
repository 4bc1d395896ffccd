use serde_json::Value;

use crate::database::ValueType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub ty: ValueType,
    pub nullable: bool,
}

impl FieldInfo {
    pub fn new(ty: ValueType, nullable: bool) -> Self {
        Self { ty, nullable }
    }

    /// Whether `value` may be stored in this field.
    pub fn accepts(&self, value: &Value) -> bool {
        if value.is_null() {
            return self.nullable;
        }
        self.ty.accepts(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nullable_fields_accept_null() {
        let name = FieldInfo::new(ValueType::String, true);
        let age = FieldInfo::new(ValueType::Int, false);
        assert!(name.accepts(&json!(null)));
        assert!(!age.accepts(&json!(null)));
        assert!(age.accepts(&json!(40)));
        assert!(!age.accepts(&json!("forty")));
    }
}
