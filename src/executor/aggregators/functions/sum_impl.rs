use serde_json::Value;

use crate::executor::{aggregators::{Accumulator, AggregateImpl}, EngineError};

pub struct SumImpl;

impl AggregateImpl for SumImpl {
    fn name(&self) -> &'static str {
        "sum"
    }

    fn create_accumulator(&self) -> Box<dyn Accumulator> {
        Box::new(SumAcc::Empty)
    }
}

/// Integer sums stay integers until a float shows up.
enum SumAcc {
    Empty,
    Int(i128),
    Float(f64),
}

impl Accumulator for SumAcc {
    fn update(&mut self, args: &[Value]) -> Result<(), EngineError> {
        let [v] = args else {
            return Err(EngineError::AggregateArgument { func: "sum", value: Value::Array(args.to_vec()) });
        };
        let n = match v {
            Value::Null => return Ok(()),
            Value::Number(n) => n,
            other => return Err(EngineError::AggregateArgument { func: "sum", value: other.clone() }),
        };

        *self = match (&*self, n.as_i64(), n.as_f64()) {
            (SumAcc::Empty, Some(i), _) => SumAcc::Int(i128::from(i)),
            (SumAcc::Int(acc), Some(i), _) => SumAcc::Int(acc + i128::from(i)),
            (SumAcc::Empty, None, Some(f)) => SumAcc::Float(f),
            (SumAcc::Int(acc), None, Some(f)) => SumAcc::Float(*acc as f64 + f),
            (SumAcc::Float(acc), Some(i), _) => SumAcc::Float(acc + i as f64),
            (SumAcc::Float(acc), None, Some(f)) => SumAcc::Float(acc + f),
            (_, None, None) => return Err(EngineError::AggregateArgument { func: "sum", value: v.clone() }),
        };
        Ok(())
    }

    fn finalize(&self) -> Value {
        match self {
            // SUM over no rows or only nulls is null
            SumAcc::Empty => Value::Null,
            SumAcc::Int(i) => i64::try_from(*i)
                .map(|i| Value::Number(serde_json::Number::from(i)))
                .unwrap_or_else(|_| serde_json::Number::from_f64(*i as f64).map(Value::Number).unwrap_or(Value::Null)),
            SumAcc::Float(f) => serde_json::Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        }
    }
}
