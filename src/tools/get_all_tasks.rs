//! get_all_tasks 工具：按状态过滤列出任务

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::tasks::{TaskFilter, TaskRepository};
use crate::tools::Tool;

#[derive(Deserialize)]
struct GetAllTasksArgs {
    #[serde(default)]
    filter_type: Option<String>,
}

/// 列出调用者的全部任务，可按 all / complete / incomplete / overdue 过滤
pub struct GetAllTasksTool {
    repo: Arc<dyn TaskRepository>,
}

impl GetAllTasksTool {
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl Tool for GetAllTasksTool {
    fn name(&self) -> &str {
        "get_all_tasks"
    }

    fn description(&self) -> &str {
        "Get the user's tasks, optionally filtered by status (all/complete/incomplete/overdue)"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "filter_type": {
                    "type": "string",
                    "enum": ["all", "complete", "incomplete", "overdue"],
                    "description": "Status filter, defaults to all"
                }
            },
            "required": []
        })
    }

    async fn execute(&self, args: Value, caller_id: &str) -> Result<Value, String> {
        let args: GetAllTasksArgs =
            serde_json::from_value(args).map_err(|e| format!("Invalid arguments: {e}"))?;
        let filter = TaskFilter::parse(args.filter_type.as_deref().unwrap_or("all"))
            .map_err(|e| e.to_string())?;
        let tasks = self
            .repo
            .list(caller_id, filter)
            .await
            .map_err(|e| e.to_string())?;
        Ok(serde_json::json!({
            "count": tasks.len(),
            "tasks": tasks,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{InMemoryTaskRepository, TaskDraft};

    #[tokio::test]
    async fn test_list_defaults_to_all() {
        let repo = Arc::new(InMemoryTaskRepository::new());
        repo.create(
            "u1",
            TaskDraft {
                title: "a".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        repo.create(
            "u1",
            TaskDraft {
                title: "b".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let tool = GetAllTasksTool::new(repo);
        let payload = tool.execute(serde_json::json!({}), "u1").await.unwrap();
        assert_eq!(payload["count"], 2);
    }

    #[tokio::test]
    async fn test_list_unknown_filter() {
        let repo = Arc::new(InMemoryTaskRepository::new());
        let tool = GetAllTasksTool::new(repo);
        let err = tool
            .execute(serde_json::json!({"filter_type": "urgent"}), "u1")
            .await
            .unwrap_err();
        assert!(err.contains("filter_type"));
    }
}
