use std::cmp::Ordering;

use serde_json::{Map, Value};

pub struct Helpers;

impl Helpers {
    /// Stable string form of a value tuple, used as group and distinct key.
    pub fn canonical_tuple(vals: &[Value]) -> String {
        Value::Array(vals.to_vec()).to_string()
    }

    pub fn canonical_row(row: &Map<String, Value>) -> String {
        // serde_json maps iterate in key order, so equal rows serialize equally
        Value::Object(row.clone()).to_string()
    }

    /// Order of two non-null values of the same kind. Integers compare
    /// exactly; mixed numbers through `f64`. `None` when the kinds differ.
    pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
        match (a, b) {
            (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
                (Some(i), Some(j)) => Some(i.cmp(&j)),
                _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
            },
            (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
            (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
            _ => None,
        }
    }

    /// SQL equality of two non-null values; `1 = 1.0` holds.
    pub fn value_equal(a: &Value, b: &Value) -> bool {
        matches!(Self::compare_values(a, b), Some(Ordering::Equal))
    }

    /// Sort comparator. Null placement is absolute: it does not flip with
    /// the direction.
    pub fn cmp_json_for_sort(a: &Value, b: &Value, ascending: bool, nulls_last: bool) -> Ordering {
        let ord = match (a, b) {
            (Value::Null, Value::Null) => return Ordering::Equal,
            (Value::Null, _) => return if nulls_last { Ordering::Greater } else { Ordering::Less },
            (_, Value::Null) => return if nulls_last { Ordering::Less } else { Ordering::Greater },
            _ => Self::compare_values(a, b)
                .unwrap_or_else(|| Self::type_rank(a).cmp(&Self::type_rank(b))),
        };
        if ascending { ord } else { ord.reverse() }
    }

    fn type_rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Helpers;
    use serde_json::{json, Value};
    use std::cmp::Ordering::*;

    #[test]
    fn canonical_tuple_is_deterministic_and_discriminating() {
        let a = vec![json!(1), json!("x"), json!(true)];
        let b = vec![json!(1), json!("x"), json!(true)];
        assert_eq!(Helpers::canonical_tuple(&a), Helpers::canonical_tuple(&b));
        assert_ne!(Helpers::canonical_tuple(&[json!(1), json!("x")]), Helpers::canonical_tuple(&[json!(1), json!("y")]));
        assert_ne!(Helpers::canonical_tuple(&[json!(1)]), Helpers::canonical_tuple(&[json!("1")]));
    }

    #[test]
    fn compare_values_keeps_kinds_apart() {
        assert_eq!(Helpers::compare_values(&json!(2), &json!(10)), Some(Less));
        assert_eq!(Helpers::compare_values(&json!(2), &json!(1.5)), Some(Greater));
        assert_eq!(Helpers::compare_values(&json!("b"), &json!("a")), Some(Greater));
        assert_eq!(Helpers::compare_values(&json!(1), &json!("1")), None);
        assert!(Helpers::value_equal(&json!(1), &json!(1.0)));
        assert!(!Helpers::value_equal(&json!(true), &json!(1)));
    }

    #[test]
    fn large_integers_compare_exactly() {
        let a = json!(9_007_199_254_740_993i64);
        let b = json!(9_007_199_254_740_992i64);
        assert_eq!(Helpers::compare_values(&a, &b), Some(Greater));
    }

    #[test]
    fn sort_respects_direction() {
        assert_eq!(Helpers::cmp_json_for_sort(&json!(1), &json!(2), true, true), Less);
        assert_eq!(Helpers::cmp_json_for_sort(&json!(1), &json!(2), false, true), Greater);
        assert_eq!(Helpers::cmp_json_for_sort(&json!("Alice"), &json!("Bob"), true, true), Less);
        assert_eq!(Helpers::cmp_json_for_sort(&json!(false), &json!(true), false, true), Greater);
    }

    #[test]
    fn null_placement_ignores_direction() {
        let n = Value::Null;
        let z = json!(0);
        for ascending in [true, false] {
            assert_eq!(Helpers::cmp_json_for_sort(&z, &n, ascending, true), Less);
            assert_eq!(Helpers::cmp_json_for_sort(&n, &z, ascending, true), Greater);
            assert_eq!(Helpers::cmp_json_for_sort(&z, &n, ascending, false), Greater);
            assert_eq!(Helpers::cmp_json_for_sort(&n, &n, ascending, false), Equal);
        }
    }

    #[test]
    fn mixed_kinds_fall_back_to_type_rank() {
        assert_eq!(Helpers::cmp_json_for_sort(&json!(true), &json!(0), true, true), Less);
        assert_eq!(Helpers::cmp_json_for_sort(&json!(0), &json!("s"), true, true), Less);
        assert_eq!(Helpers::cmp_json_for_sort(&json!("s"), &json!(0), false, true), Less);
    }
}
