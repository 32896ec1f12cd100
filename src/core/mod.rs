//! 核心层：错误分类与编排协议

pub mod classifier;
pub mod orchestrator;

pub use classifier::{classify, ErrorKind};
pub use orchestrator::{
    parse_model_output, ModelOutput, OrchestrationOutcome, Orchestrator, ToolCall,
};
