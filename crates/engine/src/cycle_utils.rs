use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use cron::Schedule as CronSchedule;

use jobgraph_core::{CycleEvaluator, ScheduleError, ScheduleResult};

/// 基于CRON表达式的周期求值器
///
/// 周期表达式解析为cron调度，下次运行时间 = `from` 之后的第一个周期边界
/// 加上全部锚点偏移量之和。
pub struct CronCycleEvaluator;

impl CronCycleEvaluator {
    fn parse(cycle_spec: &str) -> ScheduleResult<CronSchedule> {
        CronSchedule::from_str(cycle_spec).map_err(|e| ScheduleError::InvalidCycle {
            expr: cycle_spec.to_string(),
            message: e.to_string(),
        })
    }

    /// 验证周期表达式是否有效
    pub fn validate_cycle_expression(cycle_spec: &str) -> ScheduleResult<()> {
        Self::parse(cycle_spec)?;
        Ok(())
    }
}

impl CycleEvaluator for CronCycleEvaluator {
    fn next_time(
        &self,
        cycle_spec: &str,
        anchor_offsets: &[Duration],
        from: DateTime<Utc>,
    ) -> ScheduleResult<DateTime<Utc>> {
        let schedule = Self::parse(cycle_spec)?;
        let boundary =
            schedule
                .after(&from)
                .next()
                .ok_or_else(|| ScheduleError::InvalidCycle {
                    expr: cycle_spec.to_string(),
                    message: "无法计算下一个周期边界".to_string(),
                })?;

        let offset = anchor_offsets
            .iter()
            .fold(Duration::zero(), |acc, d| acc + *d);

        Ok(boundary + offset)
    }
}
