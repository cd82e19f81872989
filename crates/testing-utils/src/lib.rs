//! # jobgraph-testing-utils
//!
//! 工作区共享的测试工具：内存版持久化网关（带故障注入）、
//! 固定输出的周期求值器、测试数据构造器。
//!
//! 作为 dev-dependency 使用:
//!
//! ```toml
//! [dev-dependencies]
//! jobgraph-testing-utils = { path = "../testing-utils" }
//! ```

pub mod builders;
pub mod evaluators;
pub mod memory_store;

pub use builders::{JobBuilder, TaskBuilder};
pub use evaluators::FixedCycleEvaluator;
pub use memory_store::MemoryTaskStore;
