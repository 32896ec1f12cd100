//! 生成后端抽象
//!
//! 所有后端（Gemini / OpenAI 兼容 / Mock）实现 GenerationClient：
//! 单次非流式生成，输入扁平 prompt，输出纯文本或原始错误串。

use async_trait::async_trait;

/// 单次生成的采样参数
#[derive(Clone, Copy, Debug)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_output_tokens: 2048,
        }
    }
}

/// 生成客户端 trait：编排器每个周期调用一到两次（Drafting / Grounding）。
/// 失败时返回提供商的原始错误文本，由错误分类器归类。
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, String>;

    /// 后端展示名（status 接口使用）
    fn model_name(&self) -> &str;
}
