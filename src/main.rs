//! Wren - Rust 对话智能体
//!
//! 入口：初始化日志与配置，把命令行参数当作一条用户消息跑一轮 Agent 并打印回复。
//! HTTP 接入等外层不在本仓库内，此二进制用于本地验证与脚本化调用。

use std::sync::Arc;

use anyhow::Context;

use wren::llm::{OpenAiClient, OpenAiEmbedder};
use wren::memory::Message;
use wren::{create_agent_components, load_config, observability, run_agent};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let question: String = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if question.trim().is_empty() {
        eprintln!("usage: wren <question>");
        std::process::exit(2);
    }

    let cfg = load_config(None).context("Failed to load config")?;
    std::fs::create_dir_all(&cfg.app.storage_root).context("Failed to create storage root")?;

    let llm = Arc::new(
        OpenAiClient::new(cfg.llm.base_url.as_deref(), &cfg.llm.model, None)
            .with_temperature(cfg.llm.temperature),
    );
    let answer_llm = Arc::new(
        OpenAiClient::new(cfg.llm.base_url.as_deref(), &cfg.llm.model, None)
            .with_temperature(cfg.llm.answer_temperature),
    );
    let embedder = Arc::new(OpenAiEmbedder::new(
        cfg.embedding.base_url.as_deref(),
        &cfg.embedding.model,
        None,
    ));

    let components = create_agent_components(&cfg, llm, answer_llm, embedder);
    let transcript = vec![Message::user(question)];
    let reply = run_agent(&components, &transcript)
        .await
        .context("Agent run failed")?;

    println!("{}", reply.reply);
    Ok(())
}
