use std::cmp::Ordering;

use serde_json::Value;

use crate::executor::{aggregators::{Accumulator, AggregateImpl}, EngineError, Helpers};

pub struct MinImpl;
pub struct MaxImpl;

impl AggregateImpl for MinImpl {
    fn name(&self) -> &'static str {
        "min"
    }

    fn create_accumulator(&self) -> Box<dyn Accumulator> {
        Box::new(ExtremaAcc { mode: Mode::Min, current: None })
    }
}

impl AggregateImpl for MaxImpl {
    fn name(&self) -> &'static str {
        "max"
    }

    fn create_accumulator(&self) -> Box<dyn Accumulator> {
        Box::new(ExtremaAcc { mode: Mode::Max, current: None })
    }
}

enum Mode {
    Min,
    Max,
}

struct ExtremaAcc {
    mode: Mode,
    current: Option<Value>,
}

impl ExtremaAcc {
    fn func(&self) -> &'static str {
        match self.mode {
            Mode::Min => "min",
            Mode::Max => "max",
        }
    }
}

impl Accumulator for ExtremaAcc {
    fn update(&mut self, args: &[Value]) -> Result<(), EngineError> {
        let [v] = args else {
            return Err(EngineError::AggregateArgument { func: self.func(), value: Value::Array(args.to_vec()) });
        };
        if v.is_null() {
            return Ok(());
        }
        let replace = match &self.current {
            None => true,
            Some(cur) => {
                let ord = Helpers::compare_values(v, cur)
                    .ok_or_else(|| EngineError::AggregateArgument { func: self.func(), value: v.clone() })?;
                match self.mode {
                    Mode::Min => ord == Ordering::Less,
                    Mode::Max => ord == Ordering::Greater,
                }
            }
        };
        if replace {
            self.current = Some(v.clone());
        }
        Ok(())
    }

    fn finalize(&self) -> Value {
        self.current.clone().unwrap_or(Value::Null)
    }
}
