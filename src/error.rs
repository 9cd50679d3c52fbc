//! Agent 错误类型
//!
//! 分层约定：Validation / NotFound 直接返回调用方（消息注明被违反的前置条件）；
//! Tool* 与 HallucinatedTool 由 ReAct 循环转为 Observation 继续对话，绝不穿透循环边界；
//! Llm / Internal 作为执行失败向上传播，只携带简短描述。

use thiserror::Error;

/// 运行过程中可能出现的错误（校验、检索、工具、LLM、解析）
#[derive(Error, Debug)]
pub enum AgentError {
    /// 输入不满足前置条件（空问题、非法 backend、索引与嵌入模型不匹配等）
    #[error("Validation error: {0}")]
    Validation(String),

    /// 引用的源文档或索引不存在
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {0}")]
    ToolExecutionFailed(String),

    #[error("Tool timeout: {0}")]
    ToolTimeout(String),

    /// LLM 给出了未注册的工具名
    #[error("Hallucinated tool: {0}")]
    HallucinatedTool(String),

    #[error("LLM error: {0}")]
    Llm(String),

    /// LLM 输出不符合 ReAct 格式
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
