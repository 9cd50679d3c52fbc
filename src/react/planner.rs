//! Planner：LLM 调用与 ReAct 输出解析
//!
//! 模型必须按严格格式回复：Thought 行之后要么是 Final Answer，要么是
//! Action + Action Input（JSON）。parse_react_output 解析失败返回 Parse 错误，
//! 由循环记为 Observation 重试，不中止请求。

use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

use crate::error::AgentError;
use crate::llm::LlmClient;
use crate::memory::Message;

/// 一次思考的解析结果
#[derive(Debug, Clone)]
pub enum ReactDecision {
    /// 终态：给出最终回答
    Final { thought: String, answer: String },
    /// 需要执行工具
    Action {
        thought: String,
        tool: String,
        input: Value,
    },
}

/// 提取第一个 Thought 行的内容；没有则为空串
fn extract_thought(output: &str) -> String {
    output
        .lines()
        .find_map(|l| l.trim().strip_prefix("Thought:"))
        .map(|t| t.trim().to_string())
        .unwrap_or_default()
}

/// 还原 Action Input：剥掉 ```json 围栏后尝试解析 JSON，失败则按原文传给工具
fn parse_action_input(raw: &str) -> Value {
    let raw = raw.trim();
    let candidate = if let Some(start) = raw.find("```") {
        let rest = &raw[start..];
        let inner = rest
            .trim_start_matches("```json")
            .trim_start_matches("```");
        match inner.find("```") {
            Some(end) => inner[..end].trim(),
            None => inner.trim(),
        }
    } else {
        raw
    };
    serde_json::from_str(candidate).unwrap_or_else(|_| Value::String(candidate.to_string()))
}

/// 解析 LLM 输出为终态回答或工具调用
pub fn parse_react_output(output: &str) -> Result<ReactDecision, AgentError> {
    let trimmed = output.trim();
    let thought = extract_thought(trimmed);

    let has_final = trimmed.contains("Final Answer:");
    let action_re = Regex::new(r"(?s)Action\s*:\s*([^\n]+)\nAction\s*Input\s*:\s*(.+)")
        .expect("valid regex");
    let action_caps = action_re.captures(trimmed);

    if has_final && action_caps.is_some() {
        return Err(AgentError::Parse(
            "reply contains both a Final Answer and an Action".to_string(),
        ));
    }

    if has_final {
        let answer = trimmed
            .split("Final Answer:")
            .nth(1)
            .unwrap_or_default()
            .trim()
            .to_string();
        return Ok(ReactDecision::Final { thought, answer });
    }

    let Some(caps) = action_caps else {
        return Err(AgentError::Parse(
            "reply has neither a Final Answer nor an Action/Action Input pair".to_string(),
        ));
    };

    let tool = caps[1]
        .trim()
        .trim_matches(|c| c == '`' || c == '"' || c == '\'' || c == '*' || c == '[' || c == ']')
        .trim()
        .to_string();
    if tool.is_empty() {
        return Err(AgentError::Parse("Action line names no tool".to_string()));
    }
    let input = parse_action_input(&caps[2]);

    Ok(ReactDecision::Action {
        thought,
        tool,
        input,
    })
}

/// Planner：持有 LLM，负责一次 system + user 的补全调用
pub struct Planner {
    llm: Arc<dyn LlmClient>,
}

impl Planner {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// 获取 LLM 累计 token 使用统计
    pub fn token_usage(&self) -> (u64, u64, u64) {
        self.llm.token_usage()
    }

    pub async fn plan(&self, system: &str, user: &str) -> Result<String, AgentError> {
        self.llm
            .complete(&[Message::system(system), Message::user(user)])
            .await
            .map_err(AgentError::Llm)
    }
}
