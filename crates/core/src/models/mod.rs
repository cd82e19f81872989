pub mod job;
pub mod task;

pub use job::Job;
pub use task::Task;
