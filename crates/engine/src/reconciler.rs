use std::sync::Arc;

use tracing::{debug, warn};

use jobgraph_core::{ScheduleError, ScheduleResult, Task, TaskStore};

use crate::schedule::Schedule;

/// Refresh 对账的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// 已跟踪的任务按持久化定义就地更新
    Updated,
    /// 此前未跟踪的持久化任务被纳入注册表
    Inserted,
    /// 持久化定义已消失，任务从注册表移除
    Removed,
}

/// 对账引擎
///
/// 在"未跟踪"、"已跟踪且依赖已解析"、"已移除"之间迁移任务，
/// 保持注册表、作业成员关系与持久化定义的一致。
///
/// 每个多步操作在首个失败的阶段停止，返回带操作名与阶段名的包装错误；
/// 已完成的阶段不回滚，重试由调用方负责（关系行插入应为幂等语义）。
pub struct Reconciler {
    store: Arc<dyn TaskStore>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    /// 从持久化定义初始化任务并注册
    ///
    /// 依次加载基本信息、属性、参数、依赖ID，解析依赖后注册。
    /// 不建立作业成员关系，由 Add 或驱动批量初始化的调用方负责。
    /// 调用方契约：按依赖序初始化。
    pub async fn init_task(&self, schedule: &mut Schedule, task_id: i64) -> ScheduleResult<()> {
        debug!("init_task[{}] 开始", task_id);

        let mut task = self
            .store
            .load_task(task_id)
            .await
            .map_err(ScheduleError::in_step("init_task", "load_base"))?
            .ok_or(ScheduleError::TaskNotFound { id: task_id })
            .map_err(ScheduleError::in_step("init_task", "load_base"))?;

        task.attributes = self
            .store
            .load_attributes(task_id)
            .await
            .map_err(ScheduleError::in_step("init_task", "load_attributes"))?;

        task.parameters = self
            .store
            .load_parameters(task_id)
            .await
            .map_err(ScheduleError::in_step("init_task", "load_parameters"))?;

        let dep_ids = self
            .store
            .load_dependency_ids(task_id)
            .await
            .map_err(ScheduleError::in_step("init_task", "load_dependency_ids"))?;
        schedule.resolve_dependencies(&mut task, dep_ids);

        schedule.add_task_list(task);

        debug!("init_task[{}] 结束", task_id);
        Ok(())
    }

    /// 将单个任务与持久化定义对账
    ///
    /// 基本信息重载返回"不存在"时视为任务已被删除：从注册表按位置移除
    /// 并同步作业成员关系（注册表侧的移除先行生效，作业侧失败以错误
    /// 返回，可能留下两侧不一致的局部失败状态，待后续 Refresh 收敛）。
    /// 重载成功时重载属性、参数并重新解析依赖；此前未跟踪的任务被注册
    /// 并加入所属作业。
    pub async fn refresh_task(
        &self,
        schedule: &mut Schedule,
        task_id: i64,
    ) -> ScheduleResult<RefreshOutcome> {
        debug!("refresh_task[{}] 开始", task_id);

        let tracked = schedule.position_of(task_id);

        let reloaded = self
            .store
            .load_task(task_id)
            .await
            .map_err(ScheduleError::in_step("refresh_task", "load_base"))?;

        let Some(mut task) = reloaded else {
            let Some(index) = tracked else {
                return Err(ScheduleError::in_step("refresh_task", "load_base")(
                    ScheduleError::TaskNotFound { id: task_id },
                ));
            };
            let removed = schedule.remove_task_at(index);
            debug!("任务 [{}] 的持久化定义已消失，移出注册表", removed.id);

            let job = schedule
                .job_mut(removed.job_id)
                .map_err(ScheduleError::in_step("refresh_task", "remove_job_membership"))?;
            job.remove_task(removed.id)
                .map_err(ScheduleError::in_step("refresh_task", "remove_job_membership"))?;
            return Ok(RefreshOutcome::Removed);
        };

        task.attributes = self
            .store
            .load_attributes(task_id)
            .await
            .map_err(ScheduleError::in_step("refresh_task", "load_attributes"))?;

        task.parameters = self
            .store
            .load_parameters(task_id)
            .await
            .map_err(ScheduleError::in_step("refresh_task", "load_parameters"))?;

        let dep_ids = self
            .store
            .load_dependency_ids(task_id)
            .await
            .map_err(ScheduleError::in_step("refresh_task", "load_dependency_ids"))?;
        schedule.resolve_dependencies(&mut task, dep_ids);

        match tracked {
            Some(index) => {
                // 运行期状态不来自持久化定义，从被替换的条目继承
                let previous = schedule.task_at(index);
                task.next_run_time = previous.next_run_time;
                task.previous_run_time = previous.previous_run_time;

                let job_id = task.job_id;
                schedule.replace_task_at(index, task);

                // 恢复作业成员不变式
                match schedule.job_mut(job_id) {
                    Ok(job) => {
                        if !job.contains_task(task_id) {
                            warn!("任务 [{}] 缺少作业 [{}] 成员关系，已补齐", task_id, job_id);
                            job.add_task(task_id);
                        }
                    }
                    Err(_) => {
                        warn!("任务 [{}] 所属作业 [{}] 未注册", task_id, job_id);
                    }
                }

                debug!("refresh_task[{}] 更新完成", task_id);
                Ok(RefreshOutcome::Updated)
            }
            None => {
                let job_id = task.job_id;
                schedule.add_task_list(task);

                // 任务已在注册表中生效，作业缺失时以错误返回（局部失败状态）
                let job = schedule
                    .job_mut(job_id)
                    .map_err(ScheduleError::in_step("refresh_task", "register_job_membership"))?;
                job.add_task(task_id);

                debug!("refresh_task[{}] 纳入注册表", task_id);
                Ok(RefreshOutcome::Inserted)
            }
        }
    }

    /// 端到端持久化新任务
    ///
    /// 依次写入基本行、作业关系行、每个已解析依赖的关系行（未解析的
    /// 依赖静默跳过）、每个参数行。任一阶段失败立即返回，已提交的阶段
    /// 保持提交状态。
    pub async fn add_task(&self, task: &Task) -> ScheduleResult<()> {
        self.store
            .insert_task(task)
            .await
            .map_err(ScheduleError::in_step("add_task", "save_base"))?;

        self.store
            .insert_job_relation(task.job_id, task.id)
            .await
            .map_err(ScheduleError::in_step("add_task", "insert_job_relation"))?;

        for dep_id in task.resolved_dep_ids() {
            self.store
                .insert_dependency(task.id, dep_id)
                .await
                .map_err(ScheduleError::in_step("add_task", "insert_dependency"))?;
        }

        for parameter in &task.parameters {
            self.store
                .insert_parameter(task.id, parameter)
                .await
                .map_err(ScheduleError::in_step("add_task", "insert_parameter"))?;
        }

        Ok(())
    }

    /// 更新任务的持久化定义：更新基本行后重建参数行
    pub async fn update_task(&self, task: &Task) -> ScheduleResult<()> {
        self.store
            .update_task(task)
            .await
            .map_err(ScheduleError::in_step("update_task", "save_base"))?;

        self.store
            .delete_parameters(task.id)
            .await
            .map_err(ScheduleError::in_step("update_task", "delete_parameters"))?;

        for parameter in &task.parameters {
            self.store
                .insert_parameter(task.id, parameter)
                .await
                .map_err(ScheduleError::in_step("update_task", "insert_parameter"))?;
        }

        Ok(())
    }

    /// 删除任务的持久化定义
    ///
    /// 固定顺序：参数行、`dep_ids` 中每条依赖关系行、作业关系行、基本行。
    /// 中途失败即中止，已删除的阶段不恢复，可能留下只剩基本行的"幽灵"任务。
    pub async fn delete_task(&self, task: &Task) -> ScheduleResult<()> {
        self.store
            .delete_parameters(task.id)
            .await
            .map_err(ScheduleError::in_step("delete_task", "delete_parameters"))?;

        for dep_id in &task.dep_ids {
            self.remove_dependency(task.id, *dep_id)
                .await
                .map_err(ScheduleError::in_step("delete_task", "delete_dependency"))?;
        }

        self.store
            .delete_job_relation(task.job_id, task.id)
            .await
            .map_err(ScheduleError::in_step("delete_task", "delete_job_relation"))?;

        self.store
            .delete_task(task.id)
            .await
            .map_err(ScheduleError::in_step("delete_task", "delete_base"))?;

        Ok(())
    }

    /// 持久化一条依赖关系行
    ///
    /// 只写持久化关系，不触碰内存中的 `dep_ids`/`deps`；
    /// 内存图的更新由调用方重新解析完成。
    pub async fn add_dependency(&self, task_id: i64, dep_id: i64) -> ScheduleResult<()> {
        self.store
            .insert_dependency(task_id, dep_id)
            .await
            .map_err(ScheduleError::in_step("add_dependency", "insert_dependency"))
    }

    /// 删除一条持久化依赖关系行，同样不触碰内存图
    pub async fn remove_dependency(&self, task_id: i64, dep_id: i64) -> ScheduleResult<()> {
        self.store
            .delete_dependency(task_id, dep_id)
            .await
            .map_err(ScheduleError::in_step("remove_dependency", "delete_dependency"))
    }
}
