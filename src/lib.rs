//! Wren - Rust 对话智能体
//!
//! 模块划分：
//! - **agent**: 无头运行时（供 HTTP 等外层调用：run_agent / ingest / query）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **error**: 错误类型（校验 / 未找到 / 工具 / LLM / 解析）
//! - **llm**: 补全与嵌入客户端抽象及实现（OpenAI 兼容 / Mock）
//! - **memory**: transcript → 只读对话记忆的按请求重建
//! - **rag**: 文档分块、向量索引、入库与 grounded 检索问答
//! - **react**: Planner、prompt 组装、scratchpad、ReAct 主循环
//! - **tools**: 工具箱（age_calculator / weather_tool / retrieval_qa）与执行器

pub mod agent;
pub mod config;
pub mod error;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod rag;
pub mod react;
pub mod tools;

pub use agent::{create_agent_components, run_agent, AgentComponents, AgentReply};
pub use config::{load_config, AppConfig};
pub use error::AgentError;
