use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use jobgraph_core::{
    CycleEvaluator, DependencyTimePolicy, Job, ScheduleError, ScheduleResult, Task,
};

/// 进程级调度注册表
///
/// 独占持有全部存活的任务与作业对象。任务集合保持注册顺序，
/// 按ID查找为线性扫描。所有变更必须经由单一持有者执行（见 actor 模块），
/// 结构本身不做并发保护。
pub struct Schedule {
    tasks: Vec<Task>,
    jobs: HashMap<i64, Job>,
    time_policy: DependencyTimePolicy,
}

impl Default for Schedule {
    fn default() -> Self {
        Self::new()
    }
}

impl Schedule {
    pub fn new() -> Self {
        Self::with_policy(DependencyTimePolicy::default())
    }

    pub fn with_policy(time_policy: DependencyTimePolicy) -> Self {
        Self {
            tasks: Vec::new(),
            jobs: HashMap::new(),
            time_policy,
        }
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// 按注册顺序访问全部任务
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get_task_by_id(&self, task_id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub(crate) fn position_of(&self, task_id: i64) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == task_id)
    }

    pub(crate) fn task_at(&self, index: usize) -> &Task {
        &self.tasks[index]
    }

    pub(crate) fn replace_task_at(&mut self, index: usize, task: Task) {
        self.tasks[index] = task;
    }

    pub(crate) fn remove_task_at(&mut self, index: usize) -> Task {
        // 保持其余任务的注册顺序
        self.tasks.remove(index)
    }

    pub fn get_job_by_id(&self, job_id: i64) -> ScheduleResult<&Job> {
        self.jobs
            .get(&job_id)
            .ok_or(ScheduleError::JobNotFound { id: job_id })
    }

    pub(crate) fn job_mut(&mut self, job_id: i64) -> ScheduleResult<&mut Job> {
        self.jobs
            .get_mut(&job_id)
            .ok_or(ScheduleError::JobNotFound { id: job_id })
    }

    pub fn register_job(&mut self, job: Job) {
        self.jobs.insert(job.id, job);
    }

    /// 把任务追加到注册表
    ///
    /// 同一身份重复注册会被跳过并记录警告，返回 false。
    pub fn add_task_list(&mut self, task: Task) -> bool {
        if self.position_of(task.id).is_some() {
            warn!("任务 [{}] 已注册，跳过重复注册", task.id);
            return false;
        }
        debug!("注册任务 [{}] {}", task.id, task.name);
        self.tasks.push(task);
        true
    }

    /// 解析任务的直接依赖
    ///
    /// 重置 `dep_ids`/`deps`/`resolved_dep_count` 后逐个解析：注册表中
    /// 存在对应存活任务的，在其字符串化ID键下记录句柄并计数；不存在的
    /// 记录 `None` 并告警，解析继续。对不变的注册表重复调用结果幂等。
    ///
    /// 调用方契约：按依赖序解析（被依赖任务先注册），否则合法的持久化
    /// 依赖也会被记为未解析。
    pub fn resolve_dependencies(&self, task: &mut Task, dep_ids: Vec<i64>) {
        task.dep_ids = dep_ids;
        task.deps = HashMap::with_capacity(task.dep_ids.len());
        task.resolved_dep_count = 0;

        for dep_id in task.dep_ids.clone() {
            let key = dep_id.to_string();
            if self.get_task_by_id(dep_id).is_some() {
                task.deps.insert(key, Some(dep_id));
                task.resolved_dep_count += 1;
            } else {
                warn!("任务 [{}] 未找到依赖任务 [{}]", task.id, key);
                task.deps.insert(key, None);
            }
        }

        if self.dependency_cycle_exists(task) {
            warn!("任务 [{}] 的依赖图中检测到循环依赖", task.id);
        }
    }

    /// 沿已解析句柄做访问集广度优先遍历，探测是否能回到任务自身
    pub fn dependency_cycle_exists(&self, task: &Task) -> bool {
        let mut visited: HashSet<i64> = HashSet::new();
        let mut queue: VecDeque<i64> = task.resolved_dep_ids().into();

        while let Some(current) = queue.pop_front() {
            if current == task.id {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(dep) = self.get_task_by_id(current) {
                queue.extend(dep.resolved_dep_ids());
            }
        }
        false
    }

    /// 计算任务的下次运行时间并写回注册表
    ///
    /// 无已解析依赖时由周期求值器给出时间；否则按依赖时间策略从上游
    /// 传播。依赖的时间必须已按依赖序先行计算，此处不做图遍历。
    pub fn compute_next_run_time(
        &mut self,
        task_id: i64,
        evaluator: &dyn CycleEvaluator,
        now: DateTime<Utc>,
    ) -> ScheduleResult<DateTime<Utc>> {
        let index = self
            .position_of(task_id)
            .ok_or(ScheduleError::TaskNotFound { id: task_id })?;

        let next = if self.tasks[index].resolved_dep_count == 0 {
            let task = &self.tasks[index];
            evaluator.next_time(
                &task.task_cycle,
                &[Duration::seconds(task.start_offset_seconds)],
                now,
            )?
        } else {
            match self.time_policy {
                DependencyTimePolicy::FirstListed => {
                    self.first_listed_dep_time(&self.tasks[index])?
                }
                DependencyTimePolicy::LatestOfAll => self.latest_dep_time(&self.tasks[index])?,
            }
        };

        self.tasks[index].next_run_time = Some(next);
        Ok(next)
    }

    /// 字面的"首个列出的依赖"规则：取 `dep_ids[0]`，未解析即失败，
    /// 不回退到首个已解析的依赖
    fn first_listed_dep_time(&self, task: &Task) -> ScheduleResult<DateTime<Utc>> {
        let first = *task.dep_ids.first().ok_or_else(|| {
            ScheduleError::Internal(format!(
                "任务 {} 的 resolved_dep_count 与 dep_ids 不一致",
                task.id
            ))
        })?;

        match task.deps.get(&first.to_string()) {
            Some(Some(dep_id)) => {
                let dep = self.get_task_by_id(*dep_id).ok_or({
                    ScheduleError::DependencyUnresolved {
                        task_id: task.id,
                        dep_id: *dep_id,
                    }
                })?;
                dep.next_run_time.ok_or(ScheduleError::DependencyTimeMissing {
                    task_id: task.id,
                    dep_id: *dep_id,
                })
            }
            _ => Err(ScheduleError::DependencyUnresolved {
                task_id: task.id,
                dep_id: first,
            }),
        }
    }

    /// 备选策略：全部已解析依赖中最晚的下次运行时间
    fn latest_dep_time(&self, task: &Task) -> ScheduleResult<DateTime<Utc>> {
        let mut latest: Option<DateTime<Utc>> = None;
        let mut first_without_time: Option<i64> = None;

        for dep_id in task.resolved_dep_ids() {
            match self.get_task_by_id(dep_id).and_then(|d| d.next_run_time) {
                Some(time) => latest = Some(latest.map_or(time, |l| l.max(time))),
                None => {
                    if first_without_time.is_none() {
                        first_without_time = Some(dep_id);
                    }
                }
            }
        }

        match (latest, first_without_time) {
            (Some(time), _) => Ok(time),
            (None, Some(dep_id)) => Err(ScheduleError::DependencyTimeMissing {
                task_id: task.id,
                dep_id,
            }),
            (None, None) => Err(ScheduleError::Internal(format!(
                "任务 {} 的 resolved_dep_count 与 deps 不一致",
                task.id
            ))),
        }
    }
}
