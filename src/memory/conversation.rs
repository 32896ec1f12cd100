//! 短期记忆：按用户维度的对话历史
//!
//! 进程级唯一的 ConversationStore 按 user_id 管理各自的历史，超出保留上限时
//! 淘汰最旧条目（FIFO）。纯内存实现，进程重启即清空——这是设计取舍而非缺陷。

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// 历史保留上限：trim 后每个用户最多保留的条数
pub const HISTORY_RETENTION: usize = 20;
/// 上下文窗口：构建 prompt 时读取的末尾条数（与保留上限相互独立）
pub const CONTEXT_WINDOW: usize = 10;

/// 消息角色（user 为用户输入，agent 为最终回复）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

impl Role {
    /// Prompt 中使用的大写标签（USER / AGENT）
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Agent => "AGENT",
        }
    }
}

/// 单条历史记录，append 之后不可变
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub role: Role,
    pub content: String,
}

impl ConversationEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn agent(content: impl Into<String>) -> Self {
        Self {
            role: Role::Agent,
            content: content.into(),
        }
    }
}

/// 单个用户的历史与该用户的整轮互斥锁
struct UserHistory {
    entries: Vec<ConversationEntry>,
    /// 同一用户的并发请求按用户串行整个编排周期，避免交错写历史
    cycle_lock: Arc<Mutex<()>>,
}

impl UserHistory {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            cycle_lock: Arc::new(Mutex::new(())),
        }
    }

    /// 超出保留上限时丢弃最旧条目，保留最近 retention 条
    fn trim(&mut self, retention: usize) {
        if self.entries.len() > retention {
            let excess = self.entries.len() - retention;
            self.entries.drain(..excess);
        }
    }
}

/// 对话存储：user_id -> 历史。内部锁只做短临界区，绝不跨 await 持有。
pub struct ConversationStore {
    users: RwLock<HashMap<String, UserHistory>>,
    retention: usize,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(HISTORY_RETENTION)
    }
}

impl ConversationStore {
    pub fn new(retention: usize) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            retention,
        }
    }

    /// 追加一条记录；首次使用时惰性创建该用户的历史。永远成功。
    pub fn append(&self, user_id: &str, entry: ConversationEntry) {
        let mut users = self.users.write().unwrap();
        let history = users
            .entry(user_id.to_string())
            .or_insert_with(UserHistory::new);
        history.entries.push(entry);
        history.trim(self.retention);
    }

    /// 一次提交完整的一轮（user + agent 两条）并 trim。
    /// 编排周期只在成功结束时调用一次，失败的周期不会留下半轮记录。
    pub fn commit_turn(&self, user_id: &str, user_text: &str, agent_text: &str) {
        let mut users = self.users.write().unwrap();
        let history = users
            .entry(user_id.to_string())
            .or_insert_with(UserHistory::new);
        history.entries.push(ConversationEntry::user(user_text));
        history.entries.push(ConversationEntry::agent(agent_text));
        history.trim(self.retention);
    }

    /// 返回末尾至多 size 条记录，保持原始时间顺序；只读无副作用
    pub fn context_window(&self, user_id: &str, size: usize) -> Vec<ConversationEntry> {
        let users = self.users.read().unwrap();
        match users.get(user_id) {
            Some(history) => {
                let start = history.entries.len().saturating_sub(size);
                history.entries[start..].to_vec()
            }
            None => Vec::new(),
        }
    }

    /// 清空该用户的历史；幂等，未知用户也安全
    pub fn clear(&self, user_id: &str) {
        let mut users = self.users.write().unwrap();
        if let Some(history) = users.get_mut(user_id) {
            history.entries.clear();
        }
    }

    pub fn history_len(&self, user_id: &str) -> usize {
        let users = self.users.read().unwrap();
        users.get(user_id).map_or(0, |h| h.entries.len())
    }

    /// 获取该用户的整轮互斥锁（Drafting → Done 全程持有）。
    /// 先在短临界区内取出 Arc，再在锁外 await，内部 RwLock 不会跨 await。
    pub async fn cycle_guard(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut users = self.users.write().unwrap();
            users
                .entry(user_id.to_string())
                .or_insert_with(UserHistory::new)
                .cycle_lock
                .clone()
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_creates_history_lazily() {
        let store = ConversationStore::default();
        assert_eq!(store.history_len("u1"), 0);
        store.append("u1", ConversationEntry::user("hi"));
        assert_eq!(store.history_len("u1"), 1);
        assert_eq!(store.history_len("u2"), 0);
    }

    #[test]
    fn test_trim_keeps_most_recent_in_order() {
        let store = ConversationStore::new(HISTORY_RETENTION);
        for i in 0..30 {
            store.append("u1", ConversationEntry::user(format!("msg-{i}")));
        }
        assert_eq!(store.history_len("u1"), HISTORY_RETENTION);
        let window = store.context_window("u1", HISTORY_RETENTION);
        assert_eq!(window.first().unwrap().content, "msg-10");
        assert_eq!(window.last().unwrap().content, "msg-29");
    }

    #[test]
    fn test_context_window_never_exceeds_size() {
        let store = ConversationStore::default();
        for i in 0..15 {
            store.append("u1", ConversationEntry::user(format!("msg-{i}")));
        }
        let window = store.context_window("u1", CONTEXT_WINDOW);
        assert_eq!(window.len(), CONTEXT_WINDOW);
        assert_eq!(window[0].content, "msg-5");
        assert_eq!(window[9].content, "msg-14");

        let short = store.context_window("u2", CONTEXT_WINDOW);
        assert!(short.is_empty());
    }

    #[test]
    fn test_commit_turn_appends_pair() {
        let store = ConversationStore::default();
        store.commit_turn("u1", "create a task", "done");
        assert_eq!(store.history_len("u1"), 2);
        let window = store.context_window("u1", CONTEXT_WINDOW);
        assert_eq!(window[0].role, Role::User);
        assert_eq!(window[1].role, Role::Agent);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let store = ConversationStore::default();
        store.append("u1", ConversationEntry::user("hi"));
        store.clear("u1");
        assert_eq!(store.history_len("u1"), 0);
        store.clear("u1");
        store.clear("nobody");
        assert!(store.context_window("u1", CONTEXT_WINDOW).is_empty());
    }

    #[tokio::test]
    async fn test_cycle_guard_serializes_same_user() {
        use std::sync::Arc;

        let store = Arc::new(ConversationStore::default());
        let guard = store.cycle_guard("u1").await;

        // 同一用户的第二次获取必须等待
        let store2 = store.clone();
        let pending = tokio::spawn(async move {
            let _g = store2.cycle_guard("u1").await;
        });
        tokio::task::yield_now().await;
        assert!(!pending.is_finished());

        // 不同用户互不阻塞
        let _other = store.cycle_guard("u2").await;

        drop(guard);
        pending.await.unwrap();
    }
}
