use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 任务定义
///
/// 表示调度图中的单个可调度单元，包含调度描述、执行描述与依赖状态。
///
/// # 字段说明
///
/// - `id`: 任务的唯一标识符，持久化后不可变
/// - `job_id`: 所属作业ID，创建后不可变
/// - `schedule_cycle` / `task_cycle`: 周期表达式（cron 格式），由周期求值器消费
/// - `start_offset_seconds`: 周期内的启动偏移量（秒）
/// - `timeout_seconds`: 超时时间（秒），0 表示不做超时限制
/// - `parameters`: 有序的参数列表
/// - `attributes`: 属性键值对，键唯一
/// - `dep_ids`: 依赖的任务ID，顺序有意义（首个依赖驱动时间传播）
/// - `deps`: 字符串化ID到已解析句柄的映射；`None` 表示该依赖未解析
/// - `resolved_dep_count`: `dep_ids` 中成功解析的条目数
///
/// 不变式: `resolved_dep_count <= dep_ids.len()`。`deps` 中的句柄只用于查询，
/// 不承载所有权，规范的任务对象始终由 Schedule 独占持有。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub task_type: i64,
    pub schedule_cycle: String,
    pub task_cycle: String,
    pub exec_type: i32,
    pub disabled: bool,
    pub priority: i32,
    pub start_offset_seconds: i64,
    pub command: String,
    pub description: String,
    pub timeout_seconds: i64,
    pub parameters: Vec<String>,
    pub attributes: HashMap<String, String>,
    pub job_id: i64,
    pub dep_ids: Vec<i64>,
    #[serde(skip)]
    pub deps: HashMap<String, Option<i64>>,
    pub resolved_dep_count: i64,
    pub created_by: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_by: i64,
    pub modified_at: Option<DateTime<Utc>>,
    pub next_run_time: Option<DateTime<Utc>>,
    pub previous_run_time: Option<DateTime<Utc>>,
}

impl Task {
    /// 任务身份的字符串形式，作为 `deps` 与 `Job::tasks` 的键
    pub fn id_key(&self) -> String {
        self.id.to_string()
    }

    /// 任务是否可参与调度
    pub fn is_active(&self) -> bool {
        !self.disabled
    }

    /// 是否设置了超时限制
    pub fn has_timeout(&self) -> bool {
        self.timeout_seconds > 0
    }

    /// 指定依赖当前是否已解析为存活任务
    pub fn is_dependency_resolved(&self, dep_id: i64) -> bool {
        matches!(self.deps.get(&dep_id.to_string()), Some(Some(_)))
    }

    /// 按 `dep_ids` 顺序返回已解析的依赖句柄
    pub fn resolved_dep_ids(&self) -> Vec<i64> {
        self.dep_ids
            .iter()
            .filter(|id| self.is_dependency_resolved(**id))
            .copied()
            .collect()
    }
}
