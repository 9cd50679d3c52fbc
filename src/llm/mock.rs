//! Mock LLM 与嵌入实现（用于测试，无需 API）
//!
//! MockLlmClient 将最后一条 User 消息回显为 Final Answer；
//! ScriptedLlmClient 按脚本顺序返回预置输出，便于逐步驱动 ReAct 循环；
//! HashEmbedder 用词袋哈希产生确定性向量，使检索测试可离线运行。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{EmbeddingProvider, LlmClient};
use crate::memory::{Message, Role};

/// Mock 客户端：以 ReAct 格式直接给出 Final Answer（回显用户最后一条消息）
#[derive(Debug, Default)]
pub struct MockLlmClient;

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, String> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| matches!(m.role, Role::User))
            .map(|m| m.content.as_str())
            .unwrap_or("(no input)");

        Ok(format!(
            "Thought: I can answer directly.\nFinal Answer: Echo from Mock: {}",
            last_user
        ))
    }
}

/// 脚本化客户端：按顺序弹出预置输出；脚本耗尽后重复返回最后一条
pub struct ScriptedLlmClient {
    responses: Mutex<VecDeque<String>>,
    last: Mutex<String>,
}

impl ScriptedLlmClient {
    pub fn new(responses: Vec<&str>) -> Self {
        let last = responses
            .last()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "Thought: done.\nFinal Answer: (empty script)".to_string());
        Self {
            responses: Mutex::new(responses.into_iter().map(String::from).collect()),
            last: Mutex::new(last),
        }
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(&self, _messages: &[Message]) -> Result<String, String> {
        let mut queue = self.responses.lock().unwrap();
        match queue.pop_front() {
            Some(next) => Ok(next),
            None => Ok(self.last.lock().unwrap().clone()),
        }
    }
}

/// 词袋哈希嵌入：每个小写词落入固定桶，向量维度恒定，同词重叠即相似。
/// 仅用于测试与离线示例；model_id 参与 manifest 一致性校验的语义与真实模型相同。
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new() -> Self {
        Self { dim: 64 }
    }

    fn bucket(&self, word: &str) -> usize {
        let h = word
            .bytes()
            .fold(0u64, |h, b| h.wrapping_mul(31).wrapping_add(b as u64));
        (h % self.dim as u64) as usize
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    fn model_id(&self) -> &str {
        "hash-bow-64"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, String> {
        let mut vec = vec![0.0f32; self.dim];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            vec[self.bucket(&word.to_lowercase())] += 1.0;
        }
        Ok(vec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_embedder_deterministic() {
        let e = HashEmbedder::new();
        let a = e.embed("ZEBRA42 stripes").await.unwrap();
        let b = e.embed("zebra42 stripes").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[tokio::test]
    async fn test_scripted_client_order() {
        let llm = ScriptedLlmClient::new(vec!["one", "two"]);
        assert_eq!(llm.complete(&[]).await.unwrap(), "one");
        assert_eq!(llm.complete(&[]).await.unwrap(), "two");
        // 脚本耗尽后重复最后一条
        assert_eq!(llm.complete(&[]).await.unwrap(), "two");
    }
}
