//! create_task 工具：创建新任务

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::tasks::{TaskDraft, TaskRepository};
use crate::tools::{parse_deadline, Tool};

/// 模型传入的参数；未声明的字段（比如模型臆造的 user_id）会被静默丢弃
#[derive(Deserialize)]
struct CreateTaskArgs {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    deadline: Option<String>,
}

/// 创建任务：title 必填，description / deadline 可选
pub struct CreateTaskTool {
    repo: Arc<dyn TaskRepository>,
}

impl CreateTaskTool {
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl Tool for CreateTaskTool {
    fn name(&self) -> &str {
        "create_task"
    }

    fn description(&self) -> &str {
        "Create a new task with a title, optional description and optional deadline"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "title": { "type": "string", "description": "Task title" },
                "description": { "type": "string", "description": "Optional details" },
                "deadline": { "type": "string", "description": "Optional ISO 8601 deadline" }
            },
            "required": ["title"]
        })
    }

    async fn execute(&self, args: Value, caller_id: &str) -> Result<Value, String> {
        let args: CreateTaskArgs =
            serde_json::from_value(args).map_err(|e| format!("Invalid arguments: {e}"))?;
        let deadline = match args.deadline.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(raw) => Some(parse_deadline(raw)?),
            None => None,
        };
        let task = self
            .repo
            .create(
                caller_id,
                TaskDraft {
                    title: args.title,
                    description: args.description,
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
    use crate::tasks::InMemoryTaskRepository;

    #[tokio::test]
    async fn test_create_ignores_model_supplied_user_id() {
        let repo = Arc::new(InMemoryTaskRepository::new());
        let tool = CreateTaskTool::new(repo.clone());
        // 模型塞进来的 user_id 不生效，归属永远是带外注入的 caller_id
        let payload = tool
            .execute(
                serde_json::json!({"title": "Buy milk", "user_id": "intruder"}),
                "u1",
            )
            .await
            .unwrap();
        assert_eq!(payload["owner_id"], "u1");
        assert_eq!(payload["title"], "Buy milk");
        assert_eq!(payload["completed"], false);
    }

    #[tokio::test]
    async fn test_create_rejects_missing_title() {
        let repo = Arc::new(InMemoryTaskRepository::new());
        let tool = CreateTaskTool::new(repo);
        let err = tool
            .execute(serde_json::json!({"description": "no title"}), "u1")
            .await
            .unwrap_err();
        assert!(err.contains("Invalid arguments"));
    }

    #[tokio::test]
    async fn test_create_with_bad_deadline() {
        let repo = Arc::new(InMemoryTaskRepository::new());
        let tool = CreateTaskTool::new(repo);
        let err = tool
            .execute(
                serde_json::json!({"title": "x", "deadline": "next week"}),
                "u1",
            )
            .await
            .unwrap_err();
        assert!(err.contains("Invalid deadline"));
    }
}
