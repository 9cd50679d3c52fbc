//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / Mock / 测试脚本）实现 LlmClient::complete。

use async_trait::async_trait;

use crate::memory::Message;

/// LLM 客户端 trait：非流式对话补全
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 对话补全，返回首条回复文本；失败时返回错误字符串
    async fn complete(&self, messages: &[Message]) -> Result<String, String>;

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}
