use serde_json::Value;

use crate::executor::{aggregators::{Accumulator, AggregateImpl}, EngineError};

pub struct CountImpl;

impl AggregateImpl for CountImpl {
    fn name(&self) -> &'static str {
        "count"
    }

    fn create_accumulator(&self) -> Box<dyn Accumulator> {
        Box::new(CountAcc { cnt: 0 })
    }
}

struct CountAcc {
    cnt: i64,
}

impl Accumulator for CountAcc {
    fn update(&mut self, args: &[Value]) -> Result<(), EngineError> {
        match args {
            // COUNT(*)
            [] => self.cnt += 1,
            // COUNT(expr) skips nulls
            [v] => {
                if !v.is_null() {
                    self.cnt += 1;
                }
            }
            _ => return Err(EngineError::AggregateArgument { func: "count", value: Value::Array(args.to_vec()) }),
        }
        Ok(())
    }

    fn finalize(&self) -> Value {
        Value::Number(serde_json::Number::from(self.cnt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn count_star_and_count_expr() {
        let mut acc = CountImpl.create_accumulator();
        acc.update(&[]).unwrap();
        acc.update(&[Value::Null]).unwrap();
        acc.update(&[json!(1)]).unwrap();
        assert_eq!(acc.finalize(), json!(2));
        assert!(acc.update(&[json!(1), json!(2)]).is_err());
    }

    #[test]
    fn empty_group_counts_zero() {
        assert_eq!(CountImpl.create_accumulator().finalize(), json!(0));
    }
}
