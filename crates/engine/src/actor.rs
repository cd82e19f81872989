use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use jobgraph_core::{CycleEvaluator, Job, ScheduleError, ScheduleResult, Task, TaskStore};

use crate::reconciler::{Reconciler, RefreshOutcome};
use crate::schedule::Schedule;

/// 提交给调度 actor 的命令
///
/// 所有图变更与查询都以命令形式进入单一持有者，结果经 oneshot 通道返回。
pub enum ScheduleCommand {
    InitTask {
        task_id: i64,
        reply: oneshot::Sender<ScheduleResult<()>>,
    },
    RefreshTask {
        task_id: i64,
        reply: oneshot::Sender<ScheduleResult<RefreshOutcome>>,
    },
    AddTask {
        task: Box<Task>,
        reply: oneshot::Sender<ScheduleResult<()>>,
    },
    UpdateTask {
        task: Box<Task>,
        reply: oneshot::Sender<ScheduleResult<()>>,
    },
    DeleteTask {
        task_id: i64,
        reply: oneshot::Sender<ScheduleResult<()>>,
    },
    AddDependency {
        task_id: i64,
        dep_id: i64,
        reply: oneshot::Sender<ScheduleResult<()>>,
    },
    RemoveDependency {
        task_id: i64,
        dep_id: i64,
        reply: oneshot::Sender<ScheduleResult<()>>,
    },
    ComputeNextRunTime {
        task_id: i64,
        now: DateTime<Utc>,
        reply: oneshot::Sender<ScheduleResult<DateTime<Utc>>>,
    },
    GetTask {
        task_id: i64,
        reply: oneshot::Sender<Option<Task>>,
    },
    GetJob {
        job_id: i64,
        reply: oneshot::Sender<ScheduleResult<Job>>,
    },
    RegisterJob {
        job: Job,
        reply: oneshot::Sender<()>,
    },
    ListTaskIds {
        reply: oneshot::Sender<Vec<i64>>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// 调度 actor 的客户端句柄，可克隆，跨任务共享
///
/// 同一句柄提交的命令按提交顺序生效；不同任务身份之间除调用方自行
/// 维持的依赖序外无顺序保证。命令本身不带超时，需要截止语义的调用方
/// 自行包装，并把超时视为"不应用已返回的局部效果"。
#[derive(Clone)]
pub struct ScheduleHandle {
    tx: mpsc::Sender<ScheduleCommand>,
}

impl ScheduleHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> ScheduleCommand,
    ) -> ScheduleResult<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| ScheduleError::ChannelClosed)?;
        rx.await.map_err(|_| ScheduleError::ChannelClosed)
    }

    pub async fn init_task(&self, task_id: i64) -> ScheduleResult<()> {
        self.request(|reply| ScheduleCommand::InitTask { task_id, reply })
            .await?
    }

    pub async fn refresh_task(&self, task_id: i64) -> ScheduleResult<RefreshOutcome> {
        self.request(|reply| ScheduleCommand::RefreshTask { task_id, reply })
            .await?
    }

    /// 持久化新任务；内存图不在此更新，经 Refresh 纳入
    pub async fn add_task(&self, task: Task) -> ScheduleResult<()> {
        self.request(|reply| ScheduleCommand::AddTask {
            task: Box::new(task),
            reply,
        })
        .await?
    }

    pub async fn update_task(&self, task: Task) -> ScheduleResult<()> {
        self.request(|reply| ScheduleCommand::UpdateTask {
            task: Box::new(task),
            reply,
        })
        .await?
    }

    /// 按注册表中的快照删除任务的持久化定义；
    /// 注册表侧的移除由下一次 Refresh 完成
    pub async fn delete_task(&self, task_id: i64) -> ScheduleResult<()> {
        self.request(|reply| ScheduleCommand::DeleteTask { task_id, reply })
            .await?
    }

    pub async fn add_dependency(&self, task_id: i64, dep_id: i64) -> ScheduleResult<()> {
        self.request(|reply| ScheduleCommand::AddDependency {
            task_id,
            dep_id,
            reply,
        })
        .await?
    }

    pub async fn remove_dependency(&self, task_id: i64, dep_id: i64) -> ScheduleResult<()> {
        self.request(|reply| ScheduleCommand::RemoveDependency {
            task_id,
            dep_id,
            reply,
        })
        .await?
    }

    pub async fn compute_next_run_time(
        &self,
        task_id: i64,
        now: DateTime<Utc>,
    ) -> ScheduleResult<DateTime<Utc>> {
        self.request(|reply| ScheduleCommand::ComputeNextRunTime {
            task_id,
            now,
            reply,
        })
        .await?
    }

    /// 返回任务的只读快照
    pub async fn get_task(&self, task_id: i64) -> ScheduleResult<Option<Task>> {
        self.request(|reply| ScheduleCommand::GetTask { task_id, reply })
            .await
    }

    pub async fn get_job(&self, job_id: i64) -> ScheduleResult<Job> {
        self.request(|reply| ScheduleCommand::GetJob { job_id, reply })
            .await?
    }

    pub async fn register_job(&self, job: Job) -> ScheduleResult<()> {
        self.request(|reply| ScheduleCommand::RegisterJob { job, reply })
            .await
    }

    /// 按注册顺序返回全部任务ID，供对账驱动器迭代
    pub async fn list_task_ids(&self) -> ScheduleResult<Vec<i64>> {
        self.request(|reply| ScheduleCommand::ListTaskIds { reply })
            .await
    }

    pub async fn shutdown(&self) -> ScheduleResult<()> {
        self.request(|reply| ScheduleCommand::Shutdown { reply })
            .await
    }
}

/// 调度图的单一持有者
///
/// 独占持有 Schedule 与 Reconciler，逐条处理命令，使全部变更
/// 在一个任务上串行化。
pub struct ScheduleActor {
    schedule: Schedule,
    reconciler: Reconciler,
    evaluator: Arc<dyn CycleEvaluator>,
    rx: mpsc::Receiver<ScheduleCommand>,
}

/// 启动调度 actor，返回客户端句柄与 actor 任务的 JoinHandle
pub fn spawn(
    schedule: Schedule,
    store: Arc<dyn TaskStore>,
    evaluator: Arc<dyn CycleEvaluator>,
    buffer: usize,
) -> (ScheduleHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(buffer);
    let actor = ScheduleActor {
        schedule,
        reconciler: Reconciler::new(store),
        evaluator,
        rx,
    };
    let handle = tokio::spawn(actor.run());
    (ScheduleHandle { tx }, handle)
}

impl ScheduleActor {
    async fn run(mut self) {
        info!("调度 actor 启动");
        while let Some(command) = self.rx.recv().await {
            match command {
                ScheduleCommand::InitTask { task_id, reply } => {
                    let result = self.reconciler.init_task(&mut self.schedule, task_id).await;
                    let _ = reply.send(result);
                }
                ScheduleCommand::RefreshTask { task_id, reply } => {
                    let result = self
                        .reconciler
                        .refresh_task(&mut self.schedule, task_id)
                        .await;
                    let _ = reply.send(result);
                }
                ScheduleCommand::AddTask { task, reply } => {
                    let result = self.reconciler.add_task(&task).await;
                    let _ = reply.send(result);
                }
                ScheduleCommand::UpdateTask { task, reply } => {
                    let result = self.reconciler.update_task(&task).await;
                    let _ = reply.send(result);
                }
                ScheduleCommand::DeleteTask { task_id, reply } => {
                    let result = match self.schedule.get_task_by_id(task_id) {
                        Some(task) => {
                            let snapshot = task.clone();
                            self.reconciler.delete_task(&snapshot).await
                        }
                        None => Err(ScheduleError::TaskNotFound { id: task_id }),
                    };
                    let _ = reply.send(result);
                }
                ScheduleCommand::AddDependency {
                    task_id,
                    dep_id,
                    reply,
                } => {
                    let result = self.reconciler.add_dependency(task_id, dep_id).await;
                    let _ = reply.send(result);
                }
                ScheduleCommand::RemoveDependency {
                    task_id,
                    dep_id,
                    reply,
                } => {
                    let result = self.reconciler.remove_dependency(task_id, dep_id).await;
                    let _ = reply.send(result);
                }
                ScheduleCommand::ComputeNextRunTime {
                    task_id,
                    now,
                    reply,
                } => {
                    let result =
                        self.schedule
                            .compute_next_run_time(task_id, self.evaluator.as_ref(), now);
                    let _ = reply.send(result);
                }
                ScheduleCommand::GetTask { task_id, reply } => {
                    let _ = reply.send(self.schedule.get_task_by_id(task_id).cloned());
                }
                ScheduleCommand::GetJob { job_id, reply } => {
                    let _ = reply.send(self.schedule.get_job_by_id(job_id).map(Job::clone));
                }
                ScheduleCommand::RegisterJob { job, reply } => {
                    self.schedule.register_job(job);
                    let _ = reply.send(());
                }
                ScheduleCommand::ListTaskIds { reply } => {
                    let ids = self.schedule.tasks().iter().map(|t| t.id).collect();
                    let _ = reply.send(ids);
                }
                ScheduleCommand::Shutdown { reply } => {
                    let _ = reply.send(());
                    break;
                }
            }
        }
        debug!("调度命令通道关闭，actor 退出");
    }
}
