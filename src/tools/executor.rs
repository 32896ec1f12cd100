//! 工具执行器
//!
//! 持有 ToolRegistry 与全局超时，execute(tool_name, args, caller_id) 在超时内调用工具，
//! 把未注册、失败、超时全部收敛为 ToolResult——原始错误绝不向编排器抛出；
//! 每次调用输出结构化审计日志（JSON）。

use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::time::timeout;

use crate::tools::ToolRegistry;

/// 工具层错误分类：未注册 / 操作执行失败（含超时）
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolErrorKind {
    UnknownTool,
    OperationFailed,
}

/// 单次工具调用的统一结果：成功负载或分类后的错误
#[derive(Clone, Debug)]
pub enum ToolResult {
    Ok(Value),
    Err { kind: ToolErrorKind, message: String },
}

impl ToolResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, ToolResult::Ok(_))
    }

    /// 转为 grounding prompt 中嵌入的 JSON：成功为负载本身，失败为 {"error": ...}
    pub fn to_json(&self) -> Value {
        match self {
            ToolResult::Ok(data) => data.clone(),
            ToolResult::Err { message, .. } => serde_json::json!({ "error": message }),
        }
    }
}

/// 工具执行器：对每次调用注入调用者身份并施加超时
pub struct ToolExecutor {
    registry: ToolRegistry,
    timeout: Duration,
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry, timeout_secs: u64) -> Self {
        Self {
            registry,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// 执行指定工具；未注册返回 UnknownTool，失败或超时返回 OperationFailed；输出 JSON 审计日志
    pub async fn execute(&self, tool_name: &str, args: Value, caller_id: &str) -> ToolResult {
        let Some(tool) = self.registry.get(tool_name) else {
            return ToolResult::Err {
                kind: ToolErrorKind::UnknownTool,
                message: format!("Unknown tool: {tool_name}"),
            };
        };

        let start = Instant::now();
        let args_preview = args_preview(&args);
        let result = timeout(self.timeout, tool.execute(args, caller_id)).await;

        let outcome = match &result {
            Ok(Ok(_)) => "ok",
            Ok(Err(_)) => "error",
            Err(_) => "timeout",
        };
        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": tool_name,
            "ok": matches!(result, Ok(Ok(_))),
            "outcome": outcome,
            "duration_ms": start.elapsed().as_millis() as u64,
            "args_preview": args_preview,
        });
        tracing::info!(audit = %audit.to_string(), "tool");

        match result {
            Ok(Ok(data)) => ToolResult::Ok(data),
            Ok(Err(e)) => ToolResult::Err {
                kind: ToolErrorKind::OperationFailed,
                message: e,
            },
            Err(_) => ToolResult::Err {
                kind: ToolErrorKind::OperationFailed,
                message: format!("{tool_name}: timed out after {}s", self.timeout.as_secs()),
            },
        }
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.registry.tool_names()
    }

    pub fn tool_count(&self) -> usize {
        self.registry.len()
    }
}

fn args_preview(args: &Value) -> String {
    let s = args.to_string();
    if s.len() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::Tool;
    use async_trait::async_trait;

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str {
            "failing"
        }

        fn description(&self) -> &str {
            "Always fails"
        }

        async fn execute(&self, _args: Value, _caller_id: &str) -> Result<Value, String> {
            Err("database unavailable".to_string())
        }
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let executor = ToolExecutor::new(ToolRegistry::new(), 5);
        let result = executor
            .execute("nonexistent", serde_json::json!({}), "u1")
            .await;
        match result {
            ToolResult::Err { kind, message } => {
                assert_eq!(kind, ToolErrorKind::UnknownTool);
                assert!(message.contains("nonexistent"));
            }
            _ => panic!("Expected UnknownTool"),
        }
    }

    #[tokio::test]
    async fn test_operation_failure_is_absorbed() {
        let mut registry = ToolRegistry::new();
        registry.register(FailingTool);
        let executor = ToolExecutor::new(registry, 5);
        let result = executor
            .execute("failing", serde_json::json!({}), "u1")
            .await;
        match result {
            ToolResult::Err { kind, message } => {
                assert_eq!(kind, ToolErrorKind::OperationFailed);
                assert_eq!(message, "database unavailable");
            }
            _ => panic!("Expected OperationFailed"),
        }
    }

    #[test]
    fn test_result_to_json() {
        let ok = ToolResult::Ok(serde_json::json!({"id": "t1"}));
        assert_eq!(ok.to_json(), serde_json::json!({"id": "t1"}));

        let err = ToolResult::Err {
            kind: ToolErrorKind::OperationFailed,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_json(), serde_json::json!({"error": "boom"}));
    }
}
