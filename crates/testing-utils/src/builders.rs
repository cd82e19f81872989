//! 测试数据构造器，带合理默认值，按需覆盖

use std::collections::HashMap;

use jobgraph_core::{Job, Task};

pub struct TaskBuilder {
    task: Task,
}

impl Default for TaskBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskBuilder {
    pub fn new() -> Self {
        Self {
            task: Task {
                id: 1,
                name: "test_task".to_string(),
                address: "127.0.0.1".to_string(),
                task_type: 1,
                schedule_cycle: "0 0 0 * * *".to_string(),
                task_cycle: "0 0 * * * *".to_string(),
                exec_type: 0,
                disabled: false,
                priority: 1,
                start_offset_seconds: 0,
                command: "/bin/true".to_string(),
                description: String::new(),
                timeout_seconds: 0,
                parameters: vec![],
                attributes: HashMap::new(),
                job_id: 1,
                dep_ids: vec![],
                deps: HashMap::new(),
                resolved_dep_count: 0,
                created_by: 1,
                created_at: None,
                modified_by: 1,
                modified_at: None,
                next_run_time: None,
                previous_run_time: None,
            },
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.task.id = id;
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.task.name = name.to_string();
        self
    }

    pub fn with_job_id(mut self, job_id: i64) -> Self {
        self.task.job_id = job_id;
        self
    }

    pub fn with_task_cycle(mut self, cycle: &str) -> Self {
        self.task.task_cycle = cycle.to_string();
        self
    }

    pub fn with_start_offset_seconds(mut self, seconds: i64) -> Self {
        self.task.start_offset_seconds = seconds;
        self
    }

    pub fn with_command(mut self, command: &str) -> Self {
        self.task.command = command.to_string();
        self
    }

    pub fn with_parameters(mut self, parameters: Vec<&str>) -> Self {
        self.task.parameters = parameters.into_iter().map(String::from).collect();
        self
    }

    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        self.task.attributes.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_dep_ids(mut self, dep_ids: Vec<i64>) -> Self {
        self.task.dep_ids = dep_ids;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.task.disabled = true;
        self
    }

    pub fn build(self) -> Task {
        self.task
    }
}

pub struct JobBuilder {
    job: Job,
}

impl Default for JobBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl JobBuilder {
    pub fn new() -> Self {
        Self {
            job: Job::new(1, "test_job"),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.job.id = id;
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.job.name = name.to_string();
        self
    }

    pub fn with_task_ids(mut self, task_ids: Vec<i64>) -> Self {
        for task_id in task_ids {
            self.job.add_task(task_id);
        }
        self
    }

    pub fn build(self) -> Job {
        self.job
    }
}
