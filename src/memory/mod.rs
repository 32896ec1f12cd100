//! 记忆层：按用户维度的短期对话历史

pub mod conversation;

pub use conversation::{
    ConversationEntry, ConversationStore, Role, CONTEXT_WINDOW, HISTORY_RETENTION,
};
