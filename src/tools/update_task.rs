//! update_task 工具：修改任务的标题、描述、完成状态或截止时间

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::tasks::{TaskPatch, TaskRepository};
use crate::tools::{parse_deadline, Tool};

#[derive(Deserialize)]
struct UpdateTaskArgs {
    task_id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    completed: Option<bool>,
    #[serde(default)]
    deadline: Option<String>,
}

/// 更新任务：task_id 必填，其余字段缺省保持原值；deadline 传空串表示清除
pub struct UpdateTaskTool {
    repo: Arc<dyn TaskRepository>,
}

impl UpdateTaskTool {
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl Tool for UpdateTaskTool {
    fn name(&self) -> &str {
        "update_task"
    }

    fn description(&self) -> &str {
        "Update a task's title, description, completion status or deadline by task_id"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "task_id": { "type": "string", "description": "Task UUID" },
                "title": { "type": "string" },
                "description": { "type": "string" },
                "completed": { "type": "boolean" },
                "deadline": { "type": "string", "description": "ISO 8601, empty string clears the deadline" }
            },
            "required": ["task_id"]
        })
    }

    async fn execute(&self, args: Value, caller_id: &str) -> Result<Value, String> {
        let args: UpdateTaskArgs =
            serde_json::from_value(args).map_err(|e| format!("Invalid arguments: {e}"))?;
        let deadline = match args.deadline.as_deref() {
            None => None,
            Some(raw) if raw.trim().is_empty() => Some(None),
            Some(raw) => Some(Some(parse_deadline(raw)?)),
        };
        let task = self
            .repo
            .update(
                caller_id,
                &args.task_id,
                TaskPatch {
                    title: args.title,
                    description: args.description,
                    completed: args.completed,
                    deadline,
                },
            )
            .await
            .map_err(|e| e.to_string())?;
        serde_json::to_value(&task).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{InMemoryTaskRepository, TaskDraft};

    #[tokio::test]
    async fn test_update_completion() {
        let repo = Arc::new(InMemoryTaskRepository::new());
        let task = repo
            .create(
                "u1",
                TaskDraft {
                    title: "todo".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let tool = UpdateTaskTool::new(repo);
        let payload = tool
            .execute(
                serde_json::json!({"task_id": task.id, "completed": true}),
                "u1",
            )
            .await
            .unwrap();
        assert_eq!(payload["completed"], true);
        assert_eq!(payload["title"], "todo");
    }

    #[tokio::test]
    async fn test_update_missing_task() {
        let repo = Arc::new(InMemoryTaskRepository::new());
        let tool = UpdateTaskTool::new(repo);
        let err = tool
            .execute(
                serde_json::json!({"task_id": "no-such-id", "completed": true}),
                "u1",
            )
            .await
            .unwrap_err();
        assert!(err.contains("not found"));
    }
}
