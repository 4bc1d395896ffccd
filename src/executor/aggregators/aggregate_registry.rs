use std::{collections::HashMap, sync::Arc};

use once_cell::sync::Lazy;

use crate::executor::aggregators::{AggregateImpl, AvgImpl, CountImpl, MaxImpl, MinImpl, SumImpl};

static DEFAULT_REGISTRY: Lazy<AggregateRegistry> = Lazy::new(AggregateRegistry::default_aggregate_registry);

/// Case-insensitive registry of aggregates.
#[derive(Default)]
pub struct AggregateRegistry {
    by_name: HashMap<String, Arc<dyn AggregateImpl>>,
}

impl AggregateRegistry {
    pub fn new() -> Self {
        Self { by_name: HashMap::new() }
    }

    pub fn register<I: AggregateImpl + 'static>(&mut self, impl_: I) {
        self.by_name.insert(impl_.name().to_string(), Arc::new(impl_));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn AggregateImpl>> {
        self.by_name.get(&name.to_ascii_lowercase()).cloned()
    }

    pub fn list(&self) -> Vec<String> {
        let mut v: Vec<_> = self.by_name.keys().cloned().collect();
        v.sort();
        v
    }

    pub fn default_aggregate_registry() -> Self {
        let mut registry = Self::new();
        registry.register(CountImpl);
        registry.register(SumImpl);
        registry.register(AvgImpl);
        registry.register(MinImpl);
        registry.register(MaxImpl);
        registry
    }

    /// Process-wide instance of [`AggregateRegistry::default_aggregate_registry`].
    pub fn shared() -> &'static AggregateRegistry {
        &DEFAULT_REGISTRY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn registry_contains_all_and_lookup_is_case_insensitive() {
        let r = AggregateRegistry::shared();
        assert_eq!(r.list(), vec!["avg", "count", "max", "min", "sum"]);
        assert!(r.get("COUNT").is_some());
        assert!(r.get("sUm").is_some());
        assert!(r.get("median").is_none());
    }

    #[test]
    fn accumulators_basic_semantics() {
        let r = AggregateRegistry::default_aggregate_registry();

        let mut count = r.get("count").unwrap().create_accumulator();
        count.update(&[]).unwrap();
        count.update(&[Value::Null]).unwrap();
        count.update(&[json!(1)]).unwrap();
        assert_eq!(count.finalize(), json!(2));

        let mut sum = r.get("sum").unwrap().create_accumulator();
        for v in [Value::Null, json!(2), json!(3)] {
            sum.update(&[v]).unwrap();
        }
        assert_eq!(sum.finalize(), json!(5));

        let mut min = r.get("min").unwrap().create_accumulator();
        let mut max = r.get("max").unwrap().create_accumulator();
        for s in ["pear", "apple", "plum"] {
            min.update(&[json!(s)]).unwrap();
            max.update(&[json!(s)]).unwrap();
        }
        assert_eq!(min.finalize(), json!("apple"));
        assert_eq!(max.finalize(), json!("plum"));
    }
}
