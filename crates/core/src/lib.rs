//! # jobgraph-core
//!
//! 调度图核心的基础层：数据模型（Task/Job）、错误类型、
//! 外部协作方接口（持久化网关、周期求值器）、配置与日志初始化。

pub mod config;
pub mod errors;
pub mod logging;
pub mod models;
pub mod traits;

pub use config::{AppConfig, DependencyTimePolicy};
pub use errors::{ScheduleError, ScheduleResult};
pub use logging::init_logging;
pub use models::{Job, Task};
pub use traits::{CycleEvaluator, TaskStore};
