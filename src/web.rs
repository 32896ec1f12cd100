//! HTTP API 层
//!
//! 薄路由：/api/agent/chat、/api/agent/clear-history、/api/agent/status、/api/health。
//! 调用者身份由外部令牌校验协作方给出（TokenVerifier），编排核心从不信任
//! 请求体里的 user_id——它只用来与校验结果比对。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::core::Orchestrator;
use crate::memory::ConversationStore;

/// 令牌校验边界：token -> 已验证的用户标识。
/// 具体协议（JWT、会话表等）是协作方的事，这里只消费其接口。
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Option<String>;
}

/// 静态令牌表实现：从 TASKMASTER_API_TOKENS（"token:user,token:user"）加载。
/// 适合单机部署与测试；生产部署换成真正的校验协作方。
#[derive(Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, String>,
}

impl StaticTokenVerifier {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }

    pub fn from_env() -> Self {
        let tokens = std::env::var("TASKMASTER_API_TOKENS")
            .unwrap_or_default()
            .split(',')
            .filter_map(|pair| {
                let (token, user) = pair.split_once(':')?;
                let token = token.trim();
                let user = user.trim();
                if token.is_empty() || user.is_empty() {
                    None
                } else {
                    Some((token.to_string(), user.to_string()))
                }
            })
            .collect();
        Self { tokens }
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Option<String> {
        self.tokens.get(token).cloned()
    }
}

/// 路由共享状态
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub store: Arc<ConversationStore>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub agent_name: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct ClearHistoryRequest {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct ClearHistoryResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub agent_name: String,
    pub model: String,
    pub tools_available: usize,
}

/// 从 Authorization: Bearer 头解析并校验调用者身份
async fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<String, (StatusCode, String)> {
    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or((
            StatusCode::UNAUTHORIZED,
            "Missing bearer token".to_string(),
        ))?;
    state
        .verifier
        .verify(token)
        .await
        .ok_or((StatusCode::UNAUTHORIZED, "Invalid token".to_string()))
}

/// POST /api/agent/chat：跑一个编排周期。
/// 失败周期也返回 200 + success:false，原始错误绝不外泄。
pub async fn api_chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, String)> {
    let verified_user = authenticate(&state, &headers).await?;
    if req.user_id != verified_user {
        return Err((
            StatusCode::FORBIDDEN,
            "Access denied: user_id mismatch".to_string(),
        ));
    }

    tracing::info!(user = %verified_user, "agent chat request");
    let outcome = state.orchestrator.chat(&verified_user, &req.message).await;
    Ok(Json(ChatResponse {
        response: outcome.text,
        success: outcome.success,
    }))
}

/// POST /api/agent/clear-history：清空该用户的对话历史
pub async fn api_clear_history(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ClearHistoryRequest>,
) -> Result<Json<ClearHistoryResponse>, (StatusCode, String)> {
    let verified_user = authenticate(&state, &headers).await?;
    if req.user_id != verified_user {
        return Err((
            StatusCode::FORBIDDEN,
            "Access denied: user_id mismatch".to_string(),
        ));
    }

    state.store.clear(&verified_user);
    tracing::info!(user = %verified_user, "conversation history cleared");
    Ok(Json(ClearHistoryResponse {
        success: true,
        message: "Conversation history cleared".to_string(),
    }))
}

/// GET /api/agent/status：静态自省，无状态
pub async fn api_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "active".to_string(),
        agent_name: state.agent_name.clone(),
        model: state.orchestrator.model_name().to_string(),
        tools_available: state.orchestrator.tool_count(),
    })
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/agent/chat", post(api_chat))
        .route("/api/agent/clear-history", post(api_clear_history))
        .route("/api/agent/status", get(api_status))
        .route("/api/health", get(|| async { "OK" }))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{GenerationOptions, MockGenerationClient};
    use crate::tasks::InMemoryTaskRepository;
    use crate::tools::{CreateTaskTool, ToolExecutor, ToolRegistry};

    fn build_state() -> Arc<AppState> {
        let repo = Arc::new(InMemoryTaskRepository::new());
        let mut registry = ToolRegistry::new();
        registry.register(CreateTaskTool::new(repo));
        let store = Arc::new(ConversationStore::default());
        let orchestrator = Arc::new(Orchestrator::new(
            Arc::new(MockGenerationClient::with_script(vec![Ok(
                "Hello there!".to_string()
            )])),
            ToolExecutor::new(registry, 5),
            store.clone(),
            "test".to_string(),
            GenerationOptions::default(),
        ));
        let mut tokens = HashMap::new();
        tokens.insert("tok-1".to_string(), "u1".to_string());
        Arc::new(AppState {
            orchestrator,
            store,
            verifier: Arc::new(StaticTokenVerifier::new(tokens)),
            agent_name: "TaskMasterAI".to_string(),
        })
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            format!("Bearer {token}").parse().unwrap(),
        );
        headers
    }

    #[tokio::test]
    async fn test_chat_requires_token() {
        let state = build_state();
        let err = api_chat(
            State(state),
            HeaderMap::new(),
            Json(ChatRequest {
                message: "hi".to_string(),
                user_id: "u1".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_chat_rejects_mismatched_user() {
        let state = build_state();
        let err = api_chat(
            State(state),
            bearer("tok-1"),
            Json(ChatRequest {
                message: "hi".to_string(),
                user_id: "someone-else".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_chat_roundtrip() {
        let state = build_state();
        let Json(resp) = api_chat(
            State(state.clone()),
            bearer("tok-1"),
            Json(ChatRequest {
                message: "hi".to_string(),
                user_id: "u1".to_string(),
            }),
        )
        .await
        .unwrap();
        assert!(resp.success);
        assert_eq!(resp.response, "Hello there!");
        assert_eq!(state.store.history_len("u1"), 2);
    }

    #[tokio::test]
    async fn test_clear_history_endpoint() {
        let state = build_state();
        state
            .store
            .append("u1", crate::memory::ConversationEntry::user("hi"));
        let Json(resp) = api_clear_history(
            State(state.clone()),
            bearer("tok-1"),
            Json(ClearHistoryRequest {
                user_id: "u1".to_string(),
            }),
        )
        .await
        .unwrap();
        assert!(resp.success);
        assert_eq!(state.store.history_len("u1"), 0);
    }

    #[tokio::test]
    async fn test_status_reports_tool_count() {
        let state = build_state();
        let Json(status) = api_status(State(state)).await;
        assert_eq!(status.status, "active");
        assert_eq!(status.agent_name, "TaskMasterAI");
        assert_eq!(status.tools_available, 1);
    }
}
