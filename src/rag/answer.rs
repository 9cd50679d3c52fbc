//! 检索问答：top-k 检索 + grounded 补全
//!
//! 行为契约：事实类问题只准用检索到的上下文回答；寒暄类输入可正常应答；
//! 上下文没有答案时必须以 "I don't know" 开头作答 —— 这是调用方可检测的约定，不是提示。

use std::path::Path;

use crate::error::AgentError;
use crate::llm::{EmbeddingProvider, LlmClient};
use crate::memory::Message;
use crate::rag::store::VectorIndex;

/// grounded 回答「不知道」时的固定前缀，调用方据此检测
pub const DONT_KNOW_PREFIX: &str = "I don't know";

fn grounded_prompt(context: &str, question: &str) -> String {
    format!(
        "You are a helpful assistant. Use the context to answer the question.\n\
         If the user asks a specific question that requires context and the answer \
         is not found in the context, say \"{}\".\n\
         If the user asks a general question (e.g., greetings, about yourself, casual \
         queries), answer it normally even if it is not in the context.\n\n\
         Context:\n{}\n\n\
         Question: {}\n\n\
         Answer:",
        DONT_KNOW_PREFIX, context, question
    )
}

/// 加载 index_path 处的索引并回答问题
///
/// 空问题 / 非法路径 → Validation；嵌入与补全服务失败 → Llm。
pub async fn answer_question(
    index_path: &Path,
    question: &str,
    embedder: &dyn EmbeddingProvider,
    llm: &dyn LlmClient,
    top_k: usize,
) -> Result<String, AgentError> {
    if question.trim().is_empty() {
        return Err(AgentError::Validation(
            "question must be a non-empty string".to_string(),
        ));
    }

    let index = VectorIndex::open(index_path, embedder.model_id())?;
    let hits = index.search(question, embedder, top_k).await?;
    let context = hits
        .iter()
        .map(|h| h.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    tracing::debug!(
        index = %index_path.display(),
        hits = hits.len(),
        "retrieval complete"
    );

    let prompt = grounded_prompt(&context, question);
    let answer = llm
        .complete(&[Message::user(prompt)])
        .await
        .map_err(AgentError::Llm)?;
    Ok(answer.trim().to_string())
}
