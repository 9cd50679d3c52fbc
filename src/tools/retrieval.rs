//! 检索问答工具
//!
//! 入参既接受结构化 {path, question}，也接受 weather_tool 交接的原始两行文本
//! （`PATH=...` / `QUESTION=...`，模型按规则原样转交）。缺 path 时先回退到配置的
//! 默认索引路径，仍缺则先问 path 再问 question。

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use schemars::{schema_for, JsonSchema};
use serde::Deserialize;
use serde_json::Value;

use crate::llm::{EmbeddingProvider, LlmClient};
use crate::rag::answer_question;
use crate::tools::input::opt_str;
use crate::tools::Tool;

/// 检索不到内容时的固定回答
pub const NO_ANSWER_SENTENCE: &str = "I don't know based on the provided documents.";

/// 交接契约的字面标记（与 weather_tool 的输出严格一致）
const PATH_MARKER: &str = "PATH=";
const QUESTION_MARKER: &str = "QUESTION=";

/// retrieval_qa 的参数契约（仅用于 schema 生成）
#[allow(dead_code)]
#[derive(Debug, Deserialize, JsonSchema)]
struct RetrievalArgs {
    /// 持久化索引的路径；缺省时回退到配置的默认索引
    path: Option<String>,
    /// 要回答的问题
    question: Option<String>,
}

/// 解析两行交接文本；两个标记齐备才算一次完整交接
pub fn chained_handoff(text: &str) -> Option<(String, String)> {
    let (path, question) = parse_handoff_lines(text);
    match (path, question) {
        (Some(p), Some(q)) => Some((p, q)),
        _ => None,
    }
}

fn parse_handoff_lines(text: &str) -> (Option<String>, Option<String>) {
    let mut path = None;
    let mut question = None;
    for line in text.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix(PATH_MARKER) {
            let rest = rest.trim();
            if !rest.is_empty() {
                path = Some(rest.to_string());
            }
        } else if let Some(rest) = line.strip_prefix(QUESTION_MARKER) {
            let rest = rest.trim();
            if !rest.is_empty() {
                question = Some(rest.to_string());
            }
        }
    }
    (path, question)
}

/// 检索问答工具：对指定索引跑 top-k 检索 + grounded 补全
pub struct RetrievalQaTool {
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmClient>,
    top_k: usize,
    default_index_path: Option<PathBuf>,
}

impl RetrievalQaTool {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmClient>,
        top_k: usize,
        default_index_path: Option<PathBuf>,
    ) -> Self {
        Self {
            embedder,
            llm,
            top_k,
            default_index_path,
        }
    }
}

#[async_trait]
impl Tool for RetrievalQaTool {
    fn name(&self) -> &str {
        "retrieval_qa"
    }

    fn description(&self) -> &str {
        "Use this tool for any informational question that must be answered strictly \
         from an indexed document store (RAG). Args is a JSON object with 'path' (the \
         index path) and 'question'; omit or pass null for a missing field. When a \
         previous observation contains 'PATH=' and 'QUESTION=' lines, pass that exact \
         text as the input instead."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::to_value(schema_for!(RetrievalArgs)).unwrap_or_default()
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let (path, question) = match &args {
            // 原始交接文本（或字符串化 JSON）
            Value::String(s) => match serde_json::from_str::<Value>(s) {
                Ok(v) if v.is_object() => (opt_str(&v, "path"), opt_str(&v, "question")),
                _ => parse_handoff_lines(s),
            },
            _ => (opt_str(&args, "path"), opt_str(&args, "question")),
        };

        let path = path.or_else(|| {
            self.default_index_path
                .as_ref()
                .map(|p| p.display().to_string())
        });

        // 先查 path，再查 question
        let Some(path) = path else {
            return Ok(
                "No index path provided. Pass PATH=<index path> or configure a default index."
                    .to_string(),
            );
        };
        let Some(question) = question else {
            return Ok("Provide QUESTION=<your question>.".to_string());
        };

        let answer = answer_question(
            std::path::Path::new(&path),
            &question,
            &*self.embedder,
            &*self.llm,
            self.top_k,
        )
        .await
        .map_err(|e| e.to_string())?;

        if answer.is_empty() {
            Ok(NO_ANSWER_SENTENCE.to_string())
        } else {
            Ok(answer)
        }
    }
}
