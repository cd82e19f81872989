use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use jobgraph_core::{ScheduleError, ScheduleResult, Task, TaskStore};

#[derive(Default)]
struct StoreState {
    tasks: HashMap<i64, Task>,
    attributes: HashMap<i64, HashMap<String, String>>,
    parameters: HashMap<i64, Vec<String>>,
    job_relations: HashSet<(i64, i64)>,
    // (task_id, dep_id)，保持插入顺序，插入幂等
    dependencies: Vec<(i64, i64)>,
}

/// 内存版持久化网关
///
/// 行为对齐 `TaskStore` 的契约：`load_task` 只返回基本信息，
/// 关系行插入为 insert-if-absent 语义。`fail_operation` 可以让指定
/// 操作持续失败，用于验证多步操作的局部失败行为。
pub struct MemoryTaskStore {
    state: Mutex<StoreState>,
    failing: Mutex<HashSet<String>>,
}

impl Default for MemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            failing: Mutex::new(HashSet::new()),
        }
    }

    /// 从一个完整的任务对象填充全部表：基本行、属性、参数、
    /// 作业关系行、`dep_ids` 中的依赖关系行
    pub fn seed_task(&self, task: &Task) {
        let mut state = self.state.lock().unwrap();
        state
            .attributes
            .insert(task.id, task.attributes.clone());
        state.parameters.insert(task.id, task.parameters.clone());
        state.job_relations.insert((task.job_id, task.id));
        for dep_id in &task.dep_ids {
            if !state.dependencies.contains(&(task.id, *dep_id)) {
                state.dependencies.push((task.id, *dep_id));
            }
        }
        state.tasks.insert(task.id, Self::base_record(task));
    }

    /// 模拟外部删除：只移除基本行，其余行保留
    pub fn remove_base_row(&self, task_id: i64) {
        self.state.lock().unwrap().tasks.remove(&task_id);
    }

    /// 让指定存储操作从现在起持续失败
    pub fn fail_operation(&self, operation: &str) {
        self.failing.lock().unwrap().insert(operation.to_string());
    }

    pub fn clear_failure(&self, operation: &str) {
        self.failing.lock().unwrap().remove(operation);
    }

    pub fn has_task_row(&self, task_id: i64) -> bool {
        self.state.lock().unwrap().tasks.contains_key(&task_id)
    }

    pub fn parameter_rows(&self, task_id: i64) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .parameters
            .get(&task_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn dependency_rows(&self, task_id: i64) -> Vec<i64> {
        self.state
            .lock()
            .unwrap()
            .dependencies
            .iter()
            .filter(|(t, _)| *t == task_id)
            .map(|(_, d)| *d)
            .collect()
    }

    pub fn has_job_relation(&self, job_id: i64, task_id: i64) -> bool {
        self.state
            .lock()
            .unwrap()
            .job_relations
            .contains(&(job_id, task_id))
    }

    fn base_record(task: &Task) -> Task {
        let mut record = task.clone();
        record.parameters = Vec::new();
        record.attributes = HashMap::new();
        record.dep_ids = Vec::new();
        record.deps = HashMap::new();
        record.resolved_dep_count = 0;
        record.next_run_time = None;
        record.previous_run_time = None;
        record
    }

    fn check(&self, operation: &'static str) -> ScheduleResult<()> {
        if self.failing.lock().unwrap().contains(operation) {
            return Err(ScheduleError::Store {
                operation,
                message: "注入的存储故障".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn load_task(&self, task_id: i64) -> ScheduleResult<Option<Task>> {
        self.check("load_task")?;
        Ok(self.state.lock().unwrap().tasks.get(&task_id).cloned())
    }

    async fn load_attributes(&self, task_id: i64) -> ScheduleResult<HashMap<String, String>> {
        self.check("load_attributes")?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .attributes
            .get(&task_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn load_parameters(&self, task_id: i64) -> ScheduleResult<Vec<String>> {
        self.check("load_parameters")?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .parameters
            .get(&task_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn load_dependency_ids(&self, task_id: i64) -> ScheduleResult<Vec<i64>> {
        self.check("load_dependency_ids")?;
        Ok(self.dependency_rows(task_id))
    }

    async fn insert_task(&self, task: &Task) -> ScheduleResult<()> {
        self.check("insert_task")?;
        self.state
            .lock()
            .unwrap()
            .tasks
            .insert(task.id, Self::base_record(task));
        Ok(())
    }

    async fn update_task(&self, task: &Task) -> ScheduleResult<()> {
        self.check("update_task")?;
        let mut state = self.state.lock().unwrap();
        if !state.tasks.contains_key(&task.id) {
            return Err(ScheduleError::Store {
                operation: "update_task",
                message: format!("任务行不存在: {}", task.id),
            });
        }
        state.tasks.insert(task.id, Self::base_record(task));
        Ok(())
    }

    async fn delete_task(&self, task_id: i64) -> ScheduleResult<()> {
        self.check("delete_task")?;
        self.state.lock().unwrap().tasks.remove(&task_id);
        Ok(())
    }

    async fn delete_parameters(&self, task_id: i64) -> ScheduleResult<()> {
        self.check("delete_parameters")?;
        self.state.lock().unwrap().parameters.remove(&task_id);
        Ok(())
    }

    async fn insert_parameter(&self, task_id: i64, value: &str) -> ScheduleResult<()> {
        self.check("insert_parameter")?;
        self.state
            .lock()
            .unwrap()
            .parameters
            .entry(task_id)
            .or_default()
            .push(value.to_string());
        Ok(())
    }

    async fn insert_job_relation(&self, job_id: i64, task_id: i64) -> ScheduleResult<()> {
        self.check("insert_job_relation")?;
        self.state
            .lock()
            .unwrap()
            .job_relations
            .insert((job_id, task_id));
        Ok(())
    }

    async fn delete_job_relation(&self, job_id: i64, task_id: i64) -> ScheduleResult<()> {
        self.check("delete_job_relation")?;
        self.state
            .lock()
            .unwrap()
            .job_relations
            .remove(&(job_id, task_id));
        Ok(())
    }

    async fn insert_dependency(&self, task_id: i64, dep_id: i64) -> ScheduleResult<()> {
        self.check("insert_dependency")?;
        let mut state = self.state.lock().unwrap();
        if !state.dependencies.contains(&(task_id, dep_id)) {
            state.dependencies.push((task_id, dep_id));
        }
        Ok(())
    }

    async fn delete_dependency(&self, task_id: i64, dep_id: i64) -> ScheduleResult<()> {
        self.check("delete_dependency")?;
        self.state
            .lock()
            .unwrap()
            .dependencies
            .retain(|pair| *pair != (task_id, dep_id));
        Ok(())
    }
}
