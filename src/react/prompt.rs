//! Prompt 组装
//!
//! system 段 = 行为规则 + 工具目录 + 重建的对话历史；user 段 = 当前问题 + scratchpad。
//! 规则只约束行为（历史优先、缺字段转问用户、PATH=/QUESTION= 立即转 retrieval_qa、
//! 严格输出格式），措辞可改，契约不可改。

use crate::memory::MemoryStore;
use crate::react::Scratchpad;

/// 组装 system prompt
pub fn system_prompt(catalog: &str, tool_names: &[String], memory: &MemoryStore) -> String {
    format!(
        "You are a helpful ReAct agent.\n\
         \n\
         You have access to the following tools:\n{catalog}\n\
         \n\
         Conversation so far (chat_history):\n{history}\n\
         \n\
         RULES:\n\
         1) If chat_history already contains a final answer to the current question, do NOT \
         call any tools; reuse that answer as the Final Answer directly.\n\
         2) Never invent tool inputs. Trigger the matching tool for the user's query, but if \
         an observation says something is required, ask the user for exactly that thing and \
         make it the Final Answer; do not try other actions for it.\n\
         3) If an observation contains both \"PATH=\" and \"QUESTION=\" lines, immediately \
         call the retrieval_qa tool with that exact text as Action Input. Do not alter or \
         summarize the text, and do not answer directly from weather_tool output.\n\
         4) Only call age_calculator when the user asks to calculate age; pass null for any \
         date part the user did not provide.\n\
         5) If the retrieved context contains no answer, output exactly:\n\
         Thought: No answer found in the indexed documents.\n\
         Final Answer: I don't know.\n\
         \n\
         Use the following format (strict):\n\
         Question: the input question you must answer\n\
         Thought: you should always think about what to do\n\
         Action: the action to take, one of [{tools}]\n\
         Action Input: valid JSON for the tool (no backticks or comments)\n\
         Observation: the result of the action\n\
         ... (Thought/Action/Action Input/Observation can repeat N times)\n\
         Thought: I now know the final answer\n\
         Final Answer: the final answer to the original input question\n\
         \n\
         When answering from chat_history, output ONLY the Thought line and the Final \
         Answer line.",
        catalog = catalog,
        history = memory.render(),
        tools = tool_names.join(", "),
    )
}

/// 组装 user prompt：问题 + 已有轨迹
pub fn user_prompt(question: &str, scratchpad: &Scratchpad) -> String {
    format!(
        "Question: {}\n{}Thought:",
        question,
        scratchpad.render()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{reconstruct, Message};

    #[test]
    fn test_system_prompt_carries_catalog_history_and_rules() {
        let memory = reconstruct(&[Message::user("hi"), Message::assistant("hello")]);
        let s = system_prompt(
            "- age_calculator: computes age",
            &["age_calculator".to_string(), "weather_tool".to_string()],
            &memory,
        );
        assert!(s.contains("age_calculator: computes age"));
        assert!(s.contains("User: hi"));
        assert!(s.contains("[age_calculator, weather_tool]"));
        assert!(s.contains("PATH="));
        assert!(s.contains("QUESTION="));
    }

    #[test]
    fn test_user_prompt_ends_with_thought_cue() {
        let s = user_prompt("how old am I?", &Scratchpad::new());
        assert!(s.starts_with("Question: how old am I?"));
        assert!(s.ends_with("Thought:"));
    }
}
