//! 工具箱：任务 CRUD 四件套与执行器

pub mod create_task;
pub mod delete_task;
pub mod executor;
pub mod get_all_tasks;
pub mod registry;
pub mod schema;
pub mod update_task;

pub use create_task::CreateTaskTool;
pub use delete_task::DeleteTaskTool;
pub use executor::{ToolErrorKind, ToolExecutor, ToolResult};
pub use get_all_tasks::GetAllTasksTool;
pub use registry::{Tool, ToolRegistry};
pub use schema::tool_call_schema_json;
pub use update_task::UpdateTaskTool;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// 解析模型给出的 deadline 字符串：RFC3339、无时区的 ISO 时间或纯日期
pub(crate) fn parse_deadline(raw: &str) -> Result<DateTime<Utc>, String> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date.and_hms_opt(0, 0, 0).unwrap().and_utc());
    }
    Err(format!(
        "Invalid deadline '{trimmed}', expected ISO 8601 (e.g. 2026-01-30T12:00:00Z)"
    ))
}
