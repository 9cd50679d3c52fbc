//! Headless Agent 运行时
//!
//! 供 HTTP 等外层调用的无界面入口：create_agent_components 按配置装配
//! Planner 与三件工具（age_calculator / weather_tool / retrieval_qa），
//! run_agent 对单份 transcript 重建记忆、跑 ReAct 并返回最终回复。
//! ingest / query 则是检索管道的直通入口。

use std::path::Path;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::AgentError;
use crate::llm::{EmbeddingProvider, LlmClient};
use crate::memory::{reconstruct, Message, Role};
use crate::rag::{self, IndexHandle, IngestOptions};
use crate::react::{react_loop, Planner};
use crate::tools::{
    AgeCalculatorTool, RetrievalQaTool, ToolExecutor, ToolRegistry, WeatherTool,
};

/// 预构建的 Agent 组件：Planner 与工具执行器，可多请求共享
pub struct AgentComponents {
    pub planner: Planner,
    pub executor: ToolExecutor,
}

/// 一次请求的结果：回复文本 + 可直接追加回 transcript 的 assistant 消息
#[derive(Debug, Clone)]
pub struct AgentReply {
    pub reply: String,
    pub assistant_turn: Message,
}

/// 按配置装配 Agent 组件
///
/// llm 用于 ReAct 规划，answer_llm 用于 grounded 检索问答（两者温度不同），
/// embedder 同时服务 weather 侧产物入库与 retrieval_qa 查询。
pub fn create_agent_components(
    cfg: &AppConfig,
    llm: Arc<dyn LlmClient>,
    answer_llm: Arc<dyn LlmClient>,
    embedder: Arc<dyn EmbeddingProvider>,
) -> AgentComponents {
    let ingest_opts = IngestOptions {
        backend: cfg.index.backend.clone(),
        storage_root: cfg.app.storage_root.clone(),
        chunk_size: cfg.index.chunk_size,
        chunk_overlap: cfg.index.chunk_overlap,
    };

    let mut tools = ToolRegistry::new();
    tools.register(AgeCalculatorTool::new());
    tools.register(WeatherTool::new(
        cfg.weather.base_url.clone(),
        std::env::var("WEATHER_API_KEY").ok(),
        cfg.weather.timeout_secs,
        cfg.weather.max_days,
        embedder.clone(),
        ingest_opts,
    ));
    tools.register(RetrievalQaTool::new(
        embedder,
        answer_llm,
        cfg.index.top_k,
        cfg.index.default_index_path.clone(),
    ));

    AgentComponents {
        planner: Planner::new(llm),
        executor: ToolExecutor::new(tools, cfg.tools.tool_timeout_secs),
    }
}

/// 处理一份 transcript：末条必须是非空 user 消息（活跃问题），其余重建为记忆
pub async fn run_agent(
    components: &AgentComponents,
    transcript: &[Message],
) -> Result<AgentReply, AgentError> {
    let Some((active, history)) = transcript.split_last() else {
        return Err(AgentError::Validation(
            "transcript must not be empty".to_string(),
        ));
    };
    if active.role != Role::User || active.content.trim().is_empty() {
        return Err(AgentError::Validation(
            "transcript must end with a non-empty user turn".to_string(),
        ));
    }

    let memory = reconstruct(history);
    tracing::debug!(pairs = memory.len(), "memory reconstructed");

    let result = react_loop(
        &components.planner,
        &components.executor,
        &memory,
        &active.content,
    )
    .await?;

    Ok(AgentReply {
        assistant_turn: Message::assistant(result.response.clone()),
        reply: result.response,
    })
}

/// 文档入库直通入口（HTTP 层的 create_embeddings）
pub async fn ingest(
    sources: &[String],
    embedder: &dyn EmbeddingProvider,
    opts: &IngestOptions,
) -> Result<IndexHandle, AgentError> {
    rag::ingest_paths(sources, embedder, opts).await
}

/// 检索问答直通入口（HTTP 层的 query）
pub async fn query(
    index_path: &Path,
    question: &str,
    embedder: &dyn EmbeddingProvider,
    llm: &dyn LlmClient,
    top_k: usize,
) -> Result<String, AgentError> {
    rag::answer_question(index_path, question, embedder, llm, top_k).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{HashEmbedder, MockLlmClient, ScriptedLlmClient};

    fn components(script: Vec<&str>) -> AgentComponents {
        create_agent_components(
            &AppConfig::default(),
            Arc::new(ScriptedLlmClient::new(script)),
            Arc::new(MockLlmClient),
            Arc::new(HashEmbedder::new()),
        )
    }

    #[tokio::test]
    async fn test_empty_transcript_rejected() {
        let c = components(vec!["unused"]);
        let err = run_agent(&c, &[]).await.unwrap_err();
        assert!(matches!(err, AgentError::Validation(_)));
    }

    #[tokio::test]
    async fn test_transcript_must_end_with_user_turn() {
        let c = components(vec!["unused"]);
        let transcript = vec![Message::user("hi"), Message::assistant("hello")];
        let err = run_agent(&c, &transcript).await.unwrap_err();
        assert!(matches!(err, AgentError::Validation(_)));

        let transcript = vec![Message::user("   ")];
        let err = run_agent(&c, &transcript).await.unwrap_err();
        assert!(matches!(err, AgentError::Validation(_)));
    }

    #[tokio::test]
    async fn test_reply_and_appendable_turn() {
        let c = components(vec!["Thought: direct.\nFinal Answer: hello there"]);
        let transcript = vec![Message::user("hi")];
        let reply = run_agent(&c, &transcript).await.unwrap();
        assert_eq!(reply.reply, "hello there");
        assert_eq!(reply.assistant_turn.role, Role::Assistant);
        assert_eq!(reply.assistant_turn.content, "hello there");
    }
}
