//! 任务实体与仓库边界

pub mod repository;

pub use repository::{
    InMemoryTaskRepository, RepositoryError, Task, TaskDraft, TaskFilter, TaskPatch,
    TaskRepository,
};
