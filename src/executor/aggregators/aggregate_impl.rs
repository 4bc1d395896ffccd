use crate::executor::aggregators::Accumulator;

/// Per-aggregate factory. One instance is registered per function name;
/// stateless and shared between threads.
pub trait AggregateImpl: Send + Sync {
    /// Canonical lowercase function name ("count", "sum", ...).
    fn name(&self) -> &'static str;

    /// Create a fresh accumulator instance for one group.
    fn create_accumulator(&self) -> Box<dyn Accumulator>;
}
