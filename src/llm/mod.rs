//! 生成层：客户端抽象与实现（Gemini / OpenAI 兼容 / Mock）

pub mod gemini;
pub mod mock;
pub mod openai;
pub mod traits;

pub use gemini::GeminiClient;
pub use mock::MockGenerationClient;
pub use openai::OpenAiCompatClient;
pub use traits::{GenerationClient, GenerationOptions};

use std::sync::Arc;

use crate::config::AppConfig;

/// 根据配置与环境变量选择生成后端（Gemini / OpenAI 兼容 / Mock）
pub fn create_generation_client(cfg: &AppConfig) -> Arc<dyn GenerationClient> {
    let provider = cfg.llm.provider.to_lowercase();
    let gemini_key = std::env::var("GEMINI_API_KEY")
        .ok()
        .or_else(|| std::env::var("GOOGLE_API_KEY").ok());
    // 有 Gemini Key 且未显式指定 openai 时优先 Gemini
    let use_gemini = gemini_key.is_some() && provider != "openai";
    let use_openai = std::env::var("OPENAI_API_KEY").is_ok();

    if use_gemini {
        let model = cfg
            .llm
            .gemini
            .model
            .clone()
            .unwrap_or_else(|| cfg.llm.model.clone());
        tracing::info!("Using Gemini backend ({})", model);
        Arc::new(GeminiClient::new(&model, &gemini_key.unwrap()))
    } else if use_openai {
        let model = cfg
            .llm
            .openai
            .model
            .clone()
            .unwrap_or_else(|| "gpt-4o-mini".to_string());
        tracing::info!("Using OpenAI-compatible backend ({})", model);
        Arc::new(OpenAiCompatClient::new(
            cfg.llm.base_url.as_deref(),
            &model,
            std::env::var("OPENAI_API_KEY").ok().as_deref(),
        ))
    } else {
        tracing::warn!("No API key set, using Mock backend");
        Arc::new(MockGenerationClient::new())
    }
}
