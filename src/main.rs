//! TaskMaster HTTP 服务入口
//!
//! 启动: cargo run
//! 端口可用 TASKMASTER_WEB_PORT 或 config/default.toml [web].port 指定

use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use taskmaster::config::load_config;
use taskmaster::core::Orchestrator;
use taskmaster::llm::{create_generation_client, GenerationOptions};
use taskmaster::memory::ConversationStore;
use taskmaster::prompt::system_instruction;
use taskmaster::tasks::InMemoryTaskRepository;
use taskmaster::tools::{
    CreateTaskTool, DeleteTaskTool, GetAllTasksTool, ToolExecutor, ToolRegistry, UpdateTaskTool,
};
use taskmaster::web::{router, AppState, StaticTokenVerifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .with(fmt::layer())
        .init();

    let cfg = load_config(None).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        Default::default()
    });

    let repo = Arc::new(InMemoryTaskRepository::new());
    let mut registry = ToolRegistry::new();
    registry.register(CreateTaskTool::new(repo.clone()));
    registry.register(GetAllTasksTool::new(repo.clone()));
    registry.register(UpdateTaskTool::new(repo.clone()));
    registry.register(DeleteTaskTool::new(repo));

    let instruction = system_instruction(&registry);
    let executor = ToolExecutor::new(registry, cfg.tools.tool_timeout_secs);
    let client = create_generation_client(&cfg);
    let store = Arc::new(ConversationStore::new(cfg.app.history_retention));
    let options = GenerationOptions {
        temperature: cfg.llm.temperature,
        max_output_tokens: cfg.llm.max_output_tokens,
    };
    let orchestrator = Arc::new(
        Orchestrator::new(client, executor, store.clone(), instruction, options)
            .with_context_window(cfg.app.context_window),
    );

    let state = Arc::new(AppState {
        orchestrator,
        store,
        verifier: Arc::new(StaticTokenVerifier::from_env()),
        agent_name: cfg.app.agent_name.clone(),
    });

    let port = std::env::var("TASKMASTER_WEB_PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(cfg.web.port);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("TaskMaster agent API: http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
