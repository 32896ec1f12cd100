//! delete_task 工具：按 id 永久删除任务

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::tasks::TaskRepository;
use crate::tools::Tool;

#[derive(Deserialize)]
struct DeleteTaskArgs {
    task_id: String,
}

/// 删除任务：只认 task_id，归属校验由仓库按 caller_id 完成
pub struct DeleteTaskTool {
    repo: Arc<dyn TaskRepository>,
}

impl DeleteTaskTool {
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl Tool for DeleteTaskTool {
    fn name(&self) -> &str {
        "delete_task"
    }

    fn description(&self) -> &str {
        "Permanently delete a task by task_id"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "task_id": { "type": "string", "description": "Task UUID" }
            },
            "required": ["task_id"]
        })
    }

    async fn execute(&self, args: Value, caller_id: &str) -> Result<Value, String> {
        let args: DeleteTaskArgs =
            serde_json::from_value(args).map_err(|e| format!("Invalid arguments: {e}"))?;
        self.repo
            .delete(caller_id, &args.task_id)
            .await
            .map_err(|e| e.to_string())?;
        Ok(serde_json::json!({
            "deleted": true,
            "id": args.task_id,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{InMemoryTaskRepository, TaskDraft, TaskFilter};

    #[tokio::test]
    async fn test_delete_roundtrip() {
        let repo = Arc::new(InMemoryTaskRepository::new());
        let task = repo
            .create(
                "u1",
                TaskDraft {
                    title: "gone soon".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let tool = DeleteTaskTool::new(repo.clone());
        let payload = tool
            .execute(serde_json::json!({"task_id": task.id}), "u1")
            .await
            .unwrap();
        assert_eq!(payload["deleted"], true);
        assert!(repo.list("u1", TaskFilter::All).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_other_users_task_fails() {
        let repo = Arc::new(InMemoryTaskRepository::new());
        let task = repo
            .create(
                "u1",
                TaskDraft {
                    title: "mine".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let tool = DeleteTaskTool::new(repo.clone());
        let err = tool
            .execute(serde_json::json!({"task_id": task.id}), "u2")
            .await
            .unwrap_err();
        assert!(err.contains("not found"));
        assert_eq!(repo.list("u1", TaskFilter::All).await.unwrap().len(), 1);
    }
}
