use chrono::{DateTime, Duration, Utc};

use crate::errors::ScheduleResult;

/// 周期求值器接口
///
/// 把周期表达式和锚点偏移量求值为下一个具体时间戳。
/// 给定相同输入（含 `from` 基准时间）结果必须确定；
/// 表达式非法时返回 `ScheduleError::InvalidCycle`，不得替换默认值。
pub trait CycleEvaluator: Send + Sync {
    fn next_time(
        &self,
        cycle_spec: &str,
        anchor_offsets: &[Duration],
        from: DateTime<Utc>,
    ) -> ScheduleResult<DateTime<Utc>>;
}
