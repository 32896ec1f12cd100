//! Mock 生成客户端（用于测试，无需 API）
//!
//! 可按脚本依次吐出预设的成功/失败响应；脚本耗尽或未设脚本时回显 prompt 末行，
//! 便于本地跑通完整编排周期。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{GenerationClient, GenerationOptions};

/// Mock 客户端：脚本化响应队列
#[derive(Debug, Default)]
pub struct MockGenerationClient {
    script: Mutex<VecDeque<Result<String, String>>>,
}

impl MockGenerationClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预设响应序列，每次 generate 消费一条
    pub fn with_script(responses: Vec<Result<String, String>>) -> Self {
        Self {
            script: Mutex::new(responses.into_iter().collect()),
        }
    }

    pub fn push(&self, response: Result<String, String>) {
        self.script.lock().unwrap().push_back(response);
    }
}

#[async_trait]
impl GenerationClient for MockGenerationClient {
    async fn generate(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<String, String> {
        if let Some(scripted) = self.script.lock().unwrap().pop_front() {
            return scripted;
        }
        let last_line = prompt.lines().rev().find(|l| !l.trim().is_empty());
        Ok(format!("Echo from Mock: {}", last_line.unwrap_or("(empty)")))
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
