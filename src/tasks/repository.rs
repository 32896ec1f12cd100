//! 任务仓库：CRUD 边界
//!
//! 编排核心只通过 TaskRepository trait 访问任务数据；关系型存储的接入
//! 是另一个实现的事，这里自带一个内存实现供运行与测试使用。

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// 标题长度上限（字符数）
const MAX_TITLE_CHARS: usize = 200;
/// 描述长度上限（字符数）
const MAX_DESCRIPTION_CHARS: usize = 1000;

/// 任务实体（owner_id 即鉴权后的用户标识）
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 新建任务的字段
#[derive(Clone, Debug, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub deadline: Option<DateTime<Utc>>,
}

/// 更新任务的补丁：None 表示保持原值
#[derive(Clone, Debug, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub deadline: Option<Option<DateTime<Utc>>>,
}

/// 列表过滤：all / complete / incomplete / overdue
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskFilter {
    All,
    Complete,
    Incomplete,
    Overdue,
}

impl TaskFilter {
    /// 解析过滤参数；未知取值返回错误，让模型在 grounding 时向用户解释
    pub fn parse(raw: &str) -> Result<Self, RepositoryError> {
        match raw.trim().to_lowercase().as_str() {
            "" | "all" => Ok(TaskFilter::All),
            "complete" | "completed" => Ok(TaskFilter::Complete),
            "incomplete" => Ok(TaskFilter::Incomplete),
            "overdue" => Ok(TaskFilter::Overdue),
            other => Err(RepositoryError::Validation(format!(
                "Unknown filter_type '{other}', expected all/complete/incomplete/overdue"
            ))),
        }
    }

    fn matches(&self, task: &Task, now: DateTime<Utc>) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Complete => task.completed,
            TaskFilter::Incomplete => !task.completed,
            TaskFilter::Overdue => {
                !task.completed && task.deadline.map_or(false, |d| d < now)
            }
        }
    }
}

/// 仓库错误：未找到 / 字段校验失败
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),
}

fn validate_title(title: &str) -> Result<(), RepositoryError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(RepositoryError::Validation(
            "Task title must not be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_TITLE_CHARS {
        return Err(RepositoryError::Validation(format!(
            "Task title exceeds {MAX_TITLE_CHARS} characters"
        )));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), RepositoryError> {
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(RepositoryError::Validation(format!(
            "Task description exceeds {MAX_DESCRIPTION_CHARS} characters"
        )));
    }
    Ok(())
}

/// 任务仓库接口：所有操作都以 owner_id 为边界，跨用户不可见
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, owner_id: &str, draft: TaskDraft) -> Result<Task, RepositoryError>;

    async fn list(&self, owner_id: &str, filter: TaskFilter) -> Result<Vec<Task>, RepositoryError>;

    async fn get(&self, owner_id: &str, task_id: &str) -> Result<Task, RepositoryError>;

    async fn update(
        &self,
        owner_id: &str,
        task_id: &str,
        patch: TaskPatch,
    ) -> Result<Task, RepositoryError>;

    async fn delete(&self, owner_id: &str, task_id: &str) -> Result<(), RepositoryError>;
}

/// 内存任务仓库：owner_id -> 任务列表（按创建顺序）
#[derive(Default)]
pub struct InMemoryTaskRepository {
    tasks: RwLock<HashMap<String, Vec<Task>>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn create(&self, owner_id: &str, draft: TaskDraft) -> Result<Task, RepositoryError> {
        validate_title(&draft.title)?;
        validate_description(&draft.description)?;
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            title: draft.title.trim().to_string(),
            description: draft.description,
            completed: false,
            deadline: draft.deadline,
            created_at: now,
            updated_at: now,
        };
        let mut tasks = self.tasks.write().await;
        tasks
            .entry(owner_id.to_string())
            .or_default()
            .push(task.clone());
        Ok(task)
    }

    async fn list(&self, owner_id: &str, filter: TaskFilter) -> Result<Vec<Task>, RepositoryError> {
        let tasks = self.tasks.read().await;
        let now = Utc::now();
        Ok(tasks
            .get(owner_id)
            .map(|list| {
                list.iter()
                    .filter(|t| filter.matches(t, now))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get(&self, owner_id: &str, task_id: &str) -> Result<Task, RepositoryError> {
        let tasks = self.tasks.read().await;
        tasks
            .get(owner_id)
            .and_then(|list| list.iter().find(|t| t.id == task_id))
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(task_id.to_string()))
    }

    async fn update(
        &self,
        owner_id: &str,
        task_id: &str,
        patch: TaskPatch,
    ) -> Result<Task, RepositoryError> {
        if let Some(title) = &patch.title {
            validate_title(title)?;
        }
        if let Some(description) = &patch.description {
            validate_description(description)?;
        }
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(owner_id)
            .and_then(|list| list.iter_mut().find(|t| t.id == task_id))
            .ok_or_else(|| RepositoryError::NotFound(task_id.to_string()))?;
        if let Some(title) = patch.title {
            task.title = title.trim().to_string();
        }
        if let Some(description) = patch.description {
            task.description = description;
        }
        if let Some(completed) = patch.completed {
            task.completed = completed;
        }
        if let Some(deadline) = patch.deadline {
            task.deadline = deadline;
        }
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    async fn delete(&self, owner_id: &str, task_id: &str) -> Result<(), RepositoryError> {
        let mut tasks = self.tasks.write().await;
        let list = tasks
            .get_mut(owner_id)
            .ok_or_else(|| RepositoryError::NotFound(task_id.to_string()))?;
        let before = list.len();
        list.retain(|t| t.id != task_id);
        if list.len() == before {
            return Err(RepositoryError::NotFound(task_id.to_string()));
        }
        Ok(())
    }
}
