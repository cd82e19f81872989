use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::{ScheduleError, ScheduleResult};

/// 作业定义
///
/// 任务的命名分组。`tasks` 是字符串化任务ID到任务句柄的非占有索引，
/// 规范对象由 Schedule 持有；`task_count` 始终等于该映射的大小。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub name: String,
    pub tasks: HashMap<String, i64>,
    pub task_count: i64,
}

impl Job {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            tasks: HashMap::new(),
            task_count: 0,
        }
    }

    /// 将任务加入作业成员索引，已存在时不重复计数
    pub fn add_task(&mut self, task_id: i64) {
        if self.tasks.insert(task_id.to_string(), task_id).is_none() {
            self.task_count += 1;
        }
    }

    /// 从作业成员索引中移除任务
    pub fn remove_task(&mut self, task_id: i64) -> ScheduleResult<()> {
        match self.tasks.remove(&task_id.to_string()) {
            Some(_) => {
                self.task_count -= 1;
                Ok(())
            }
            None => Err(ScheduleError::TaskNotFound { id: task_id }),
        }
    }

    pub fn contains_task(&self, task_id: i64) -> bool {
        self.tasks.contains_key(&task_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_task_is_idempotent_per_identity() {
        let mut job = Job::new(1, "etl");
        job.add_task(100);
        job.add_task(100);
        assert_eq!(job.task_count, 1);
        assert!(job.contains_task(100));
    }

    #[test]
    fn test_remove_task_decrements_count() {
        let mut job = Job::new(1, "etl");
        job.add_task(100);
        job.remove_task(100).unwrap();
        assert_eq!(job.task_count, 0);
        assert!(!job.contains_task(100));
    }

    #[test]
    fn test_remove_absent_task_is_an_error() {
        let mut job = Job::new(1, "etl");
        let err = job.remove_task(100).unwrap_err();
        assert!(matches!(err, ScheduleError::TaskNotFound { id: 100 }));
    }
}
