use chrono::{DateTime, Duration, Utc};

use jobgraph_core::{CycleEvaluator, ScheduleResult};

/// 固定输出的周期求值器
///
/// 忽略周期表达式与基准时间，返回预设时间戳加上锚点偏移量之和，
/// 便于测试验证偏移量确实被传入。
pub struct FixedCycleEvaluator {
    at: DateTime<Utc>,
}

impl FixedCycleEvaluator {
    pub fn returning(at: DateTime<Utc>) -> Self {
        Self { at }
    }
}

impl CycleEvaluator for FixedCycleEvaluator {
    fn next_time(
        &self,
        _cycle_spec: &str,
        anchor_offsets: &[Duration],
        _from: DateTime<Utc>,
    ) -> ScheduleResult<DateTime<Utc>> {
        let offset = anchor_offsets
            .iter()
            .fold(Duration::zero(), |acc, d| acc + *d);
        Ok(self.at + offset)
    }
}
