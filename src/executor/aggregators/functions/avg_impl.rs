use serde_json::Value;

use crate::executor::{aggregators::{Accumulator, AggregateImpl}, EngineError};

pub struct AvgImpl;

impl AggregateImpl for AvgImpl {
    fn name(&self) -> &'static str {
        "avg"
    }

    fn create_accumulator(&self) -> Box<dyn Accumulator> {
        Box::new(AvgAcc { sum: 0.0, cnt: 0 })
    }
}

/// Always a float: integer inputs are promoted before dividing.
struct AvgAcc {
    sum: f64,
    cnt: i64,
}

impl Accumulator for AvgAcc {
    fn update(&mut self, args: &[Value]) -> Result<(), EngineError> {
        let [v] = args else {
            return Err(EngineError::AggregateArgument { func: "avg", value: Value::Array(args.to_vec()) });
        };
        match v {
            Value::Null => {}
            Value::Number(n) => match n.as_f64() {
                Some(f) => {
                    self.sum += f;
                    self.cnt += 1;
                }
                None => return Err(EngineError::AggregateArgument { func: "avg", value: v.clone() }),
            },
            other => return Err(EngineError::AggregateArgument { func: "avg", value: other.clone() }),
        }
        Ok(())
    }

    fn finalize(&self) -> Value {
        if self.cnt == 0 {
            return Value::Null;
        }
        let avg = self.sum / (self.cnt as f64);
        serde_json::Number::from_f64(avg).map(Value::Number).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn avg_of_integers_is_not_truncated() {
        let mut a = AvgImpl.create_accumulator();
        for v in [json!(10), Value::Null, json!(15)] {
            a.update(&[v]).unwrap();
        }
        assert_eq!(a.finalize(), json!(12.5));
    }

    #[test]
    fn avg_of_nothing_is_null() {
        assert_eq!(AvgImpl.create_accumulator().finalize(), Value::Null);
    }
}
