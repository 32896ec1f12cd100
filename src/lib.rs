//! TaskMaster - Rust 任务管理对话智能体
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 编排协议与错误分类
//! - **llm**: 生成客户端抽象与实现（Gemini / OpenAI 兼容 / Mock）
//! - **memory**: 按用户维度的短期对话历史
//! - **prompt**: 系统指令拼装
//! - **tasks**: 任务实体与仓库边界
//! - **tools**: 任务 CRUD 工具与执行器
//! - **web**: HTTP API（chat / clear-history / status）

pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod prompt;
pub mod tasks;
pub mod tools;
pub mod web;
