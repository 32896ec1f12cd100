//! 编排器：单轮对话的协议引擎
//!
//! Drafting（首次生成）-> Detection（解析 tool call）->
//! 有工具则 Executing -> Grounding（二次生成），无工具则原文即答案；
//! 两条记录在周期成功结束时一次性写回历史，生成调用失败走错误分类，不碰历史。

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::classifier::{classify, ErrorKind};
use crate::llm::{GenerationClient, GenerationOptions};
use crate::memory::{ConversationStore, CONTEXT_WINDOW};
use crate::tools::{ToolExecutor, ToolResult};

/// 模型输出预览的最大字符数（日志用）
const OUTPUT_PREVIEW_CHARS: usize = 200;

/// 模型请求的 Tool Call（简化 JSON：{"tool": "create_task", "args": {...}}）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool: String,
    pub args: serde_json::Value,
}

/// 模型输出的两种形态：工具调用或直接回复
#[derive(Debug, Clone)]
pub enum ModelOutput {
    ToolCall(ToolCall),
    PlainText(String),
}

/// 解析模型输出：固定 schema 解码成功且 tool 非空则为 ToolCall，
/// 任何解析失败都降级为 PlainText（原文照用），绝不视为协议错误。
/// 每轮只识别一个 tool call，不支持链式或并行调用。
pub fn parse_model_output(raw: &str) -> ModelOutput {
    let trimmed = raw.trim();

    // 提取 JSON 块（```json ... ``` 或以 { 开头的纯 JSON）
    let candidate = if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        Some(
            rest.find("```")
                .map(|end| rest[..end].trim())
                .unwrap_or_else(|| rest.trim()),
        )
    } else if trimmed.starts_with('{') {
        Some(trimmed)
    } else {
        None
    };

    match candidate {
        Some(json_str) => match serde_json::from_str::<ToolCall>(json_str) {
            Ok(call) if !call.tool.is_empty() => ModelOutput::ToolCall(call),
            _ => ModelOutput::PlainText(trimmed.to_string()),
        },
        None => ModelOutput::PlainText(trimmed.to_string()),
    }
}

/// 单个编排周期的终态
#[derive(Debug, Clone)]
pub struct OrchestrationOutcome {
    pub text: String,
    pub success: bool,
    pub error_kind: Option<ErrorKind>,
}

/// 编排器：持有生成客户端、工具执行器、对话存储与系统指令
pub struct Orchestrator {
    client: Arc<dyn GenerationClient>,
    executor: ToolExecutor,
    store: Arc<ConversationStore>,
    system_instruction: String,
    options: GenerationOptions,
    /// 构建 prompt 时读取的历史条数（与存储的保留上限相互独立）
    context_window: usize,
}

impl Orchestrator {
    pub fn new(
        client: Arc<dyn GenerationClient>,
        executor: ToolExecutor,
        store: Arc<ConversationStore>,
        system_instruction: String,
        options: GenerationOptions,
    ) -> Self {
        Self {
            client,
            executor,
            store,
            system_instruction,
            options,
            context_window: CONTEXT_WINDOW,
        }
    }

    pub fn with_context_window(mut self, size: usize) -> Self {
        self.context_window = size;
        self
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    pub fn tool_count(&self) -> usize {
        self.executor.tool_count()
    }

    /// 跑一个完整周期：user_id 为鉴权后的调用者身份，工具执行时带外注入。
    /// 同一用户的周期串行（cycle_guard），不同用户完全并行。
    pub async fn chat(&self, user_id: &str, message: &str) -> OrchestrationOutcome {
        let _cycle = self.store.cycle_guard(user_id).await;

        let prompt = self.drafting_prompt(user_id, message);
        let draft = match self.client.generate(&prompt, &self.options).await {
            Ok(text) => text,
            Err(raw) => return self.fail(raw),
        };
        tracing::debug!(preview = %preview(&draft), "model draft");

        let reply = match parse_model_output(&draft) {
            ModelOutput::PlainText(text) => text,
            ModelOutput::ToolCall(call) => {
                tracing::info!(tool = %call.tool, "tool call detected");
                let result = self
                    .executor
                    .execute(&call.tool, call.args.clone(), user_id)
                    .await;
                let grounding = grounding_prompt(&prompt, &call, &result);
                match self.client.generate(&grounding, &self.options).await {
                    Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
                    // 二次生成给不出可用文本时，退回模板而不是整轮失败
                    Ok(_) => format!("Task completed: {}", result.to_json()),
                    Err(raw) => return self.fail(raw),
                }
            }
        };

        self.store.commit_turn(user_id, message, &reply);
        OrchestrationOutcome {
            text: reply,
            success: true,
            error_kind: None,
        }
    }

    /// 生成调用本身失败：分类出话术返回，历史保持原样
    fn fail(&self, raw: String) -> OrchestrationOutcome {
        let (kind, text) = classify(&raw);
        tracing::warn!(kind = kind.as_str(), error = %raw, "generation failure");
        OrchestrationOutcome {
            text,
            success: false,
            error_kind: Some(kind),
        }
    }

    /// Drafting prompt = 系统指令 + 上下文窗口 + 当前消息
    fn drafting_prompt(&self, user_id: &str, message: &str) -> String {
        let mut sections = vec![self.system_instruction.clone()];
        for entry in self.store.context_window(user_id, self.context_window) {
            sections.push(format!("{}: {}", entry.role.label(), entry.content));
        }
        sections.push(format!("USER: {message}"));
        sections.push("ASSISTANT:".to_string());
        sections.join("\n\n")
    }
}

/// Grounding prompt = Drafting prompt 原文 + 工具请求与结果的字面 JSON
fn grounding_prompt(drafting: &str, call: &ToolCall, result: &ToolResult) -> String {
    format!(
        "{drafting}\n\nTool call: {}\nTool result: {}\n\nBased on the tool result, provide a natural, helpful response to the user.",
        serde_json::to_string(call).unwrap_or_default(),
        result.to_json()
    )
}

fn preview(text: &str) -> String {
    if text.chars().count() > OUTPUT_PREVIEW_CHARS {
        format!(
            "{}...",
            text.chars().take(OUTPUT_PREVIEW_CHARS).collect::<String>()
        )
    } else {
        text.to_string()
    }
}
