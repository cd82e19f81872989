//! # jobgraph-engine
//!
//! 调度图引擎：进程级注册表（Schedule）、依赖解析与下次运行时间传播、
//! 对账引擎（Init/Refresh/Add/Delete）、cron 周期求值器，以及把全部
//! 图变更串行化到单一持有者的 actor 封装。

pub mod actor;
pub mod cycle_utils;
pub mod reconciler;
pub mod schedule;

pub use actor::{spawn, ScheduleCommand, ScheduleHandle};
pub use cycle_utils::CronCycleEvaluator;
pub use reconciler::{Reconciler, RefreshOutcome};
pub use schedule::Schedule;
