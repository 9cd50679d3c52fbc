//! ReAct 主循环
//!
//! THINKING -> ACTING -> OBSERVING -> THINKING …，直到 Final Answer 或步数耗尽。
//! 解析失败与工具失败都转为 Observation 续跑；步数耗尽返回尽力而为的终答，
//! 对调用方永远不是错误。PATH=/QUESTION= 交接由 prompt 规则引导，此处只做检测与日志。

use crate::error::AgentError;
use crate::memory::MemoryStore;
use crate::react::planner::{parse_react_output, Planner, ReactDecision};
use crate::react::prompt::{system_prompt, user_prompt};
use crate::react::scratchpad::{ReactStep, Scratchpad};
use crate::tools::{chained_handoff, ToolExecutor};

/// 单次请求内最大 ReAct 步数，防止死循环
pub const MAX_REACT_STEPS: usize = 8;

/// 循环执行结果：最终回复与本次轨迹
#[derive(Debug)]
pub struct ReactResult {
    pub response: String,
    pub scratchpad: Scratchpad,
}

/// 执行 ReAct 循环
///
/// memory 为本请求重建的只读对话记忆；question 为活跃用户输入。
pub async fn react_loop(
    planner: &Planner,
    executor: &ToolExecutor,
    memory: &MemoryStore,
    question: &str,
) -> Result<ReactResult, AgentError> {
    if question.trim().is_empty() {
        return Err(AgentError::Validation(
            "question must be non-empty".to_string(),
        ));
    }

    let catalog = executor.catalog();
    let tool_names = executor.tool_names();
    let system = system_prompt(&catalog, &tool_names, memory);

    let mut scratchpad = Scratchpad::new();
    let mut last_output = String::new();

    for step in 0..MAX_REACT_STEPS {
        let user = user_prompt(question, &scratchpad);
        let output = planner.plan(&system, &user).await?;
        last_output = output.clone();

        match parse_react_output(&output) {
            Ok(ReactDecision::Final { thought, answer }) => {
                tracing::debug!(step, thought = %thought, "final answer");
                return Ok(ReactResult {
                    response: answer,
                    scratchpad,
                });
            }
            Ok(ReactDecision::Action {
                thought,
                tool,
                input,
            }) => {
                tracing::debug!(step, tool = %tool, "tool call");
                let observation = match executor.execute(&tool, input.clone()).await {
                    Ok(obs) => obs,
                    // 未注册的工具名：提示可用工具，让模型自行纠正
                    Err(AgentError::HallucinatedTool(name)) => {
                        format!("Unknown tool '{}'. Use one of: {}", name, tool_names.join(", "))
                    }
                    // 其它工具失败一律转为 Observation，循环继续
                    Err(e) => e.to_string(),
                };
                if chained_handoff(&observation).is_some() {
                    tracing::debug!(step, "observation carries PATH=/QUESTION= handoff");
                }
                scratchpad.push(ReactStep {
                    thought,
                    action: Some((tool, input)),
                    observation,
                });
            }
            Err(AgentError::Parse(reason)) => {
                tracing::debug!(step, reason = %reason, "unparseable model reply");
                scratchpad.push(ReactStep {
                    thought: String::new(),
                    action: None,
                    observation: format!(
                        "Could not parse your previous reply ({}). Respond with a 'Thought:' \
                         line followed by either 'Final Answer: ...' or 'Action: <tool>' and \
                         'Action Input: <JSON>'.",
                        reason
                    ),
                });
            }
            Err(e) => return Err(e),
        }
    }

    // 步数耗尽：可恢复的终止，给出尽力而为的回答
    tracing::warn!(max_steps = MAX_REACT_STEPS, "react loop exhausted step budget");
    Ok(ReactResult {
        response: format!(
            "I was unable to complete the request within {} reasoning steps. Last model output:\n{}",
            MAX_REACT_STEPS, last_output
        ),
        scratchpad,
    })
}
