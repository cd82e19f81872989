pub mod cycle;
pub mod store;

pub use cycle::CycleEvaluator;
pub use store::TaskStore;
