use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Static type of a column, literal or expression.
///
/// `Null` is the type of the null literal only; nullability of columns is
/// tracked separately in [`FieldInfo`](super::FieldInfo).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Null,
    Bool,
    Int,
    Float,
    String,
}

impl ValueType {
    /// Classify a runtime value. Arrays and objects have no column type.
    pub fn of_value(v: &Value) -> Option<ValueType> {
        match v {
            Value::Null => Some(ValueType::Null),
            Value::Bool(_) => Some(ValueType::Bool),
            Value::Number(n) => {
                if n.is_i64() || n.is_u64() {
                    Some(ValueType::Int)
                } else {
                    Some(ValueType::Float)
                }
            }
            Value::String(_) => Some(ValueType::String),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ValueType::Int | ValueType::Float)
    }

    /// Common representative of two types: `Int` + `Float` -> `Float`, and
    /// `Null` gives way to the other side.
    pub fn promote(a: ValueType, b: ValueType) -> ValueType {
        use ValueType::*;
        if a == b { return a; }
        match (a, b) {
            (Int, Float) | (Float, Int) => Float,
            (Null, y) => y,
            (x, _) => x,
        }
    }

    /// Whether values of the two types may be compared or assigned to each other.
    pub fn is_compatible(a: ValueType, b: ValueType) -> bool {
        a == b || a == ValueType::Null || b == ValueType::Null || (a.is_numeric() && b.is_numeric())
    }

    /// Whether a value of type `found` may be stored into a slot of type
    /// `target`. Integers widen to floats; floats never narrow.
    pub fn is_assignable(target: ValueType, found: ValueType) -> bool {
        target == found || found == ValueType::Null || (target == ValueType::Float && found == ValueType::Int)
    }

    /// Whether a runtime value fits a column of this type.
    pub fn accepts(self, v: &Value) -> bool {
        match ValueType::of_value(v) {
            Some(found) => ValueType::is_compatible(self, found),
            None => false,
        }
    }
}
