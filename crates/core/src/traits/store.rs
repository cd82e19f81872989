use std::collections::HashMap;

use async_trait::async_trait;

use crate::errors::ScheduleResult;
use crate::models::Task;

/// 持久化网关接口
///
/// 调度核心对元数据存储的全部诉求。每个方法对应一种行记录操作，
/// 失败以 `ScheduleError::Store` 形式返回；`load_task` 用 `None`
/// 区分"行不存在"与真正的存储故障（Refresh 依赖这一区分判定删除）。
///
/// 关系行的插入应实现为 insert-if-absent 语义，使调用方在
/// 无回滚的多步操作失败后可以安全重试。
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// 加载任务基本信息，集合类字段（参数、属性、依赖）由各自的方法加载
    async fn load_task(&self, task_id: i64) -> ScheduleResult<Option<Task>>;

    async fn load_attributes(&self, task_id: i64) -> ScheduleResult<HashMap<String, String>>;

    /// 按持久化顺序加载参数列表
    async fn load_parameters(&self, task_id: i64) -> ScheduleResult<Vec<String>>;

    /// 按持久化顺序加载依赖任务ID
    async fn load_dependency_ids(&self, task_id: i64) -> ScheduleResult<Vec<i64>>;

    async fn insert_task(&self, task: &Task) -> ScheduleResult<()>;

    async fn update_task(&self, task: &Task) -> ScheduleResult<()>;

    /// 删除任务基本行，不级联
    async fn delete_task(&self, task_id: i64) -> ScheduleResult<()>;

    async fn delete_parameters(&self, task_id: i64) -> ScheduleResult<()>;

    async fn insert_parameter(&self, task_id: i64, value: &str) -> ScheduleResult<()>;

    async fn insert_job_relation(&self, job_id: i64, task_id: i64) -> ScheduleResult<()>;

    async fn delete_job_relation(&self, job_id: i64, task_id: i64) -> ScheduleResult<()>;

    async fn insert_dependency(&self, task_id: i64, dep_id: i64) -> ScheduleResult<()>;

    async fn delete_dependency(&self, task_id: i64, dep_id: i64) -> ScheduleResult<()>;
}
