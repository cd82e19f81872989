use thiserror::Error;

/// 调度图错误类型定义
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("存储操作失败 [{operation}]: {message}")]
    Store {
        operation: &'static str,
        message: String,
    },

    #[error("任务未找到: {id}")]
    TaskNotFound { id: i64 },

    #[error("作业未找到: {id}")]
    JobNotFound { id: i64 },

    #[error("任务 {task_id} 的依赖 {dep_id} 未解析")]
    DependencyUnresolved { task_id: i64, dep_id: i64 },

    #[error("任务 {task_id} 的依赖 {dep_id} 尚未计算下次运行时间")]
    DependencyTimeMissing { task_id: i64, dep_id: i64 },

    #[error("无效的周期表达式: {expr} - {message}")]
    InvalidCycle { expr: String, message: String },

    #[error("任务 {task_id} 检测到循环依赖")]
    CircularDependency { task_id: i64 },

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("调度命令通道已关闭")]
    ChannelClosed,

    #[error("{operation} 在 {step} 阶段失败: {source}")]
    OperationFailed {
        operation: &'static str,
        step: &'static str,
        #[source]
        source: Box<ScheduleError>,
    },

    #[error("内部错误: {0}")]
    Internal(String),
}

impl ScheduleError {
    /// 将多步操作中某一阶段的失败包装为带操作名和阶段名的错误
    pub fn in_step(operation: &'static str, step: &'static str) -> impl FnOnce(Self) -> Self {
        move |source| ScheduleError::OperationFailed {
            operation,
            step,
            source: Box::new(source),
        }
    }
}

/// 统一的Result类型
pub type ScheduleResult<T> = std::result::Result<T, ScheduleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_failed_names_operation_and_step() {
        let inner = ScheduleError::TaskNotFound { id: 7 };
        let wrapped = ScheduleError::in_step("init_task", "load_base")(inner);
        let msg = wrapped.to_string();
        assert!(msg.contains("init_task"));
        assert!(msg.contains("load_base"));
    }

    #[test]
    fn test_store_error_display() {
        let err = ScheduleError::Store {
            operation: "insert_parameter",
            message: "connection reset".to_string(),
        };
        assert!(err.to_string().contains("insert_parameter"));
    }
}
